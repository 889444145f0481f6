/// Password hashing and verification using PBKDF2-HMAC-SHA256
use crate::error::{IdentityError, Result};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

const SALT_LEN: usize = 32;
const KEY_LEN: usize = 32;
const ITERATIONS: u32 = 100_000;

/// Hash a password for storage
///
/// ## Security
///
/// - KDF: PBKDF2-HMAC-SHA256 with 100,000 iterations
/// - Salt: random 32-byte salt generated per password
/// - Stored form: `hex(salt) + ":" + hex(key)`
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, ITERATIONS, &mut key);

    format!("{}:{}", hex::encode(salt), hex::encode(key))
}

/// Verify a password against its stored form
///
/// Recomputes the derived key with the stored salt and compares in constant
/// time. Returns `false` on mismatch; malformed stored forms are an error.
pub fn verify_password(stored: &str, password: &str) -> Result<bool> {
    let (salt_hex, key_hex) = stored
        .split_once(':')
        .ok_or_else(|| IdentityError::Internal("Invalid password hash format".to_string()))?;

    let salt = hex::decode(salt_hex)
        .map_err(|_| IdentityError::Internal("Invalid password hash format".to_string()))?;
    let expected_key = hex::decode(key_hex)
        .map_err(|_| IdentityError::Internal("Invalid password hash format".to_string()))?;

    let mut key = vec![0u8; expected_key.len().max(1)];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, ITERATIONS, &mut key);

    Ok(constant_time_compare(&key, &expected_key))
}

/// Compare two byte slices without an early exit on the first differing byte
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let stored = hash_password("pw1");
        assert!(verify_password(&stored, "pw1").expect("well-formed hash"));
    }

    #[test]
    fn test_verify_wrong_password() {
        let stored = hash_password("pw1");
        assert!(!verify_password(&stored, "pw1x").expect("well-formed hash"));
        assert!(!verify_password(&stored, "").expect("well-formed hash"));
    }

    #[test]
    fn test_stored_form_shape() {
        let stored = hash_password("secret");
        let (salt_hex, key_hex) = stored.split_once(':').expect("salt:key form");
        assert_eq!(salt_hex.len(), SALT_LEN * 2);
        assert_eq!(key_hex.len(), KEY_LEN * 2);
        assert!(stored.chars().all(|c| c.is_ascii_hexdigit() || c == ':'));
    }

    #[test]
    fn test_different_salts_for_same_password() {
        let a = hash_password("pw1");
        let b = hash_password("pw1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_stored_form_is_error() {
        assert!(verify_password("no-separator", "pw1").is_err());
        assert!(verify_password("zz:zz", "pw1").is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abd"));
        assert!(!constant_time_compare(b"abc", b"ab"));
    }
}
