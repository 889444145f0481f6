/// Bearer token issuance and validation
///
/// Tokens are stateless HS256 JWTs carrying the subject username and an
/// absolute expiry. There is no revocation mechanism; a token stays valid
/// until its natural expiry.
use crate::config::AuthSettings;
use crate::error::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token claims: subject username and Unix-timestamp expiry
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Issues and validates bearer tokens with a process-wide signing key.
///
/// Owns its keys rather than reading global state so tests can construct
/// issuers with fixture settings.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret_key.as_bytes()),
            ttl: Duration::minutes(settings.token_ttl_minutes),
        }
    }

    /// Issue a token for `subject`, expiring after the configured TTL
    pub fn issue(&self, subject: &str) -> Result<String> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return its subject
    ///
    /// Fails with `InvalidToken` if the signature does not verify, the
    /// payload is malformed, or the expiry has passed. Expiry is checked
    /// with zero leeway.
    pub fn validate(&self, token: &str) -> Result<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdentityError;

    fn issuer(ttl_minutes: i64) -> TokenIssuer {
        TokenIssuer::new(&AuthSettings {
            secret_key: "test-secret-key".to_string(),
            token_ttl_minutes: ttl_minutes,
        })
    }

    #[test]
    fn test_issue_then_validate_returns_subject() {
        let tokens = issuer(30);
        let token = tokens.issue("alice").unwrap();
        assert_eq!(tokens.validate(&token).unwrap(), "alice");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Negative TTL puts exp in the past at issuance
        let tokens = issuer(-1);
        let token = tokens.issue("alice").unwrap();
        assert!(matches!(
            tokens.validate(&token),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let tokens = issuer(30);
        let mut token = tokens.issue("alice").unwrap();
        // Flip a character in the signature segment
        let flipped = if token.ends_with('a') { 'b' } else { 'a' };
        token.pop();
        token.push(flipped);
        assert!(matches!(
            tokens.validate(&token),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn test_foreign_key_is_rejected() {
        let ours = issuer(30);
        let theirs = TokenIssuer::new(&AuthSettings {
            secret_key: "another-secret".to_string(),
            token_ttl_minutes: 30,
        });
        let token = theirs.issue("alice").unwrap();
        assert!(matches!(
            ours.validate(&token),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let tokens = issuer(30);
        assert!(matches!(
            tokens.validate("not-a-token"),
            Err(IdentityError::InvalidToken)
        ));
    }
}
