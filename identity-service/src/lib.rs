/// Identity Service Library
///
/// Stores user accounts, enforces username/email uniqueness, hashes and
/// verifies credentials, and issues/validates bearer tokens. Exposed over
/// HTTP (axum) and gRPC (tonic) with a single shared authorization policy.
///
/// ## Modules
///
/// - `authz`: Authorization matrix shared by both transports
/// - `config`: Service configuration
/// - `db`: Account repository (PostgreSQL)
/// - `error`: Error types
/// - `grpc`: gRPC server implementation
/// - `http`: REST server implementation
/// - `models`: Data models
/// - `security`: Password hashing, bearer tokens
/// - `service`: Business logic
/// - `validators`: Input validation
pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod grpc;
pub mod http;
pub mod models;
pub mod security;
pub mod service;
pub mod validators;

// Re-export commonly used types
pub use error::{IdentityError, Result};
pub use grpc::IdentityServiceServer;
pub use service::UserService;
