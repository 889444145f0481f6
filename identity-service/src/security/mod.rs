/// Security primitives for the identity service
///
/// - **password**: PBKDF2-HMAC-SHA256 credential hashing and verification
/// - **token**: signed, time-limited bearer tokens (HS256)
pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer};
