use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tonic::{Code, Status};

pub type Result<T> = std::result::Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("User not found")]
    NotFound,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing or invalid credentials")]
    Unauthenticated,

    #[error("Not enough permissions")]
    Forbidden,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Convert to gRPC Status for wire protocol
    pub fn to_status(&self) -> Status {
        match self {
            IdentityError::NotFound => Status::new(Code::NotFound, "User not found"),
            IdentityError::DuplicateUsername => {
                Status::new(Code::AlreadyExists, "Username already exists")
            }
            IdentityError::DuplicateEmail => {
                Status::new(Code::AlreadyExists, "Email already exists")
            }
            IdentityError::InvalidCredentials => {
                Status::new(Code::Unauthenticated, "Invalid username or password")
            }
            IdentityError::InvalidToken | IdentityError::Unauthenticated => {
                Status::new(Code::Unauthenticated, "Missing, invalid, or expired token")
            }
            IdentityError::Forbidden => {
                Status::new(Code::PermissionDenied, "Not enough permissions")
            }
            IdentityError::InvalidArgument(msg) => {
                Status::new(Code::InvalidArgument, format!("Invalid argument: {}", msg))
            }
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                // Don't leak internal details on the wire
                Status::new(Code::Internal, "Internal server error")
            }
        }
    }
}

/// HTTP mapping for the same taxonomy; the business error is decided below
/// this layer, both transports only translate it.
impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            IdentityError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            IdentityError::DuplicateUsername | IdentityError::DuplicateEmail => {
                (StatusCode::CONFLICT, self.to_string())
            }
            IdentityError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            IdentityError::InvalidToken | IdentityError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Could not validate credentials".to_string(),
            ),
            IdentityError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            IdentityError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            IdentityError::Database(_) | IdentityError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "detail": error_message,
            "status": status.as_u16()
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert("WWW-Authenticate", HeaderValue::from_static("Bearer"));
        }
        response
    }
}

// Conversions from external error types

impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        // The unique indexes on users.username/users.email are the
        // authoritative uniqueness guard; a racing insert that slips past
        // the application-level check lands here and must surface as the
        // same typed error.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return match db_err.constraint() {
                    Some("users_username_key") => IdentityError::DuplicateUsername,
                    Some("users_email_key") => IdentityError::DuplicateEmail,
                    _ => IdentityError::Database(db_err.to_string()),
                };
            }
        }
        tracing::error!("Database error: {}", err);
        IdentityError::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for IdentityError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("Token validation failed: {}", err);
        IdentityError::InvalidToken
    }
}

impl From<validator::ValidationErrors> for IdentityError {
    fn from(err: validator::ValidationErrors) -> Self {
        IdentityError::InvalidArgument(err.to_string())
    }
}

// gRPC Status conversion
impl From<IdentityError> for Status {
    fn from(err: IdentityError) -> Self {
        err.to_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_mirror_taxonomy() {
        assert_eq!(IdentityError::NotFound.to_status().code(), Code::NotFound);
        assert_eq!(
            IdentityError::DuplicateUsername.to_status().code(),
            Code::AlreadyExists
        );
        assert_eq!(
            IdentityError::DuplicateEmail.to_status().code(),
            Code::AlreadyExists
        );
        assert_eq!(
            IdentityError::InvalidCredentials.to_status().code(),
            Code::Unauthenticated
        );
        assert_eq!(
            IdentityError::InvalidToken.to_status().code(),
            Code::Unauthenticated
        );
        assert_eq!(
            IdentityError::Forbidden.to_status().code(),
            Code::PermissionDenied
        );
        assert_eq!(
            IdentityError::InvalidArgument("bad id".into()).to_status().code(),
            Code::InvalidArgument
        );
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let status = IdentityError::Database("connection reset by peer".into()).to_status();
        assert_eq!(status.code(), Code::Internal);
        assert!(!status.message().contains("connection reset"));
    }

    #[test]
    fn test_http_statuses() {
        let cases = [
            (IdentityError::NotFound, StatusCode::NOT_FOUND),
            (IdentityError::DuplicateUsername, StatusCode::CONFLICT),
            (IdentityError::DuplicateEmail, StatusCode::CONFLICT),
            (IdentityError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (IdentityError::InvalidToken, StatusCode::UNAUTHORIZED),
            (IdentityError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (IdentityError::Forbidden, StatusCode::FORBIDDEN),
            (
                IdentityError::InvalidArgument("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                IdentityError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_unauthorized_carries_www_authenticate() {
        let response = IdentityError::Unauthenticated.into_response();
        assert_eq!(
            response
                .headers()
                .get("WWW-Authenticate")
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
    }
}
