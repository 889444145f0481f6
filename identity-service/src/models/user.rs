use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

/// Account role matching database user_role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Stored account record. Carries the credential hash and therefore never
/// implements Serialize; everything that leaves the process goes through
/// [`PublicUser`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Externally safe account projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Registration request (HTTP body; the gRPC adapter maps into this)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Partial account update; absent fields are left untouched
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 64))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from_str("user"), Some(Role::User));
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_str("root"), None);
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_public_projection_keeps_identity_fields() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::User,
            password_hash: "aa:bb".to_string(),
            created_at: Utc::now(),
        };
        let public = PublicUser::from(user.clone());
        assert_eq!(public.id, user.id);
        assert_eq!(public.username, user.username);
        assert_eq!(public.email, user.email);
        assert_eq!(public.role, user.role);
        assert_eq!(public.created_at, user.created_at);
    }

    #[test]
    fn test_public_projection_never_serializes_hash() {
        let public = PublicUser {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("\"role\":\"admin\""));
    }

    #[test]
    fn test_create_user_validation() {
        let valid = CreateUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "pw1".to_string(),
            role: Role::User,
        };
        assert!(validator::Validate::validate(&valid).is_ok());

        let bad_email = CreateUser {
            email: "not-an-email".to_string(),
            ..valid
        };
        assert!(validator::Validate::validate(&bad_email).is_err());
    }

    #[test]
    fn test_update_user_validates_only_present_fields() {
        let empty = UpdateUser::default();
        assert!(validator::Validate::validate(&empty).is_ok());

        let bad_email = UpdateUser {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(validator::Validate::validate(&bad_email).is_err());
    }
}
