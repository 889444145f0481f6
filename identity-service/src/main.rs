/// Identity Service Main Entry Point
///
/// Starts both transport surfaces against shared state:
/// - HTTP server (axum) with CORS and request tracing
/// - gRPC server (tonic) with health checks and a correlation-id interceptor
use anyhow::{Context, Result};
use identity_service::{
    config::Settings,
    grpc::atrium::identity::user_service_server::UserServiceServer,
    http::{start_http_server, AppState},
    security::token::TokenIssuer,
    IdentityServiceServer, UserService,
};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tokio::signal;
use tonic::{metadata::MetadataValue, transport::Server, Request, Status};
use tracing::info;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "identity_service=info,info".into()),
        )
        .with_target(false)
        .init();

    info!("Starting identity service");

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!(
        "Database pool initialized with {} max connections",
        settings.database.max_connections
    );

    // Run database migrations (includes the authoritative unique indexes)
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let tokens = TokenIssuer::new(&settings.auth);
    let service = UserService::new(db_pool);

    // HTTP surface
    let state = AppState {
        service: service.clone(),
        tokens: tokens.clone(),
    };
    let http = start_http_server(
        state,
        &settings.server.host,
        settings.server.http_port,
        shutdown_signal(),
    );

    // gRPC surface
    let grpc_addr = format!("{}:{}", settings.server.host, settings.server.grpc_port)
        .parse()
        .context("Invalid gRPC server address")?;

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<UserServiceServer<IdentityServiceServer>>()
        .await;

    info!("Starting gRPC server on {}", grpc_addr);

    let grpc = Server::builder()
        .add_service(health_service)
        .add_service(UserServiceServer::with_interceptor(
            IdentityServiceServer::new(service, tokens),
            grpc_server_interceptor,
        ))
        .serve_with_shutdown(grpc_addr, shutdown_signal());

    tokio::try_join!(
        async { http.await.context("HTTP server error") },
        async { grpc.await.context("gRPC server error") },
    )?;

    info!("Identity service shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}

fn grpc_server_interceptor(mut req: Request<()>) -> std::result::Result<Request<()>, Status> {
    const CORRELATION_HEADER: &str = "x-correlation-id";
    if let Some(existing) = req.metadata().get(CORRELATION_HEADER) {
        if let Ok(val) = existing.to_str() {
            let stored = val.to_string();
            req.extensions_mut().insert::<String>(stored);
        }
    } else {
        let correlation_id = Uuid::new_v4().to_string();
        let value = MetadataValue::try_from(correlation_id.as_str())
            .map_err(|_| Status::internal("failed to set correlation id"))?;
        req.metadata_mut().insert(CORRELATION_HEADER, value);
    }

    Ok(req)
}
