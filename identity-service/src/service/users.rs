/// Business logic for account operations
///
/// Thin orchestration over the repository: one method per repository
/// operation, textual id parsing, and projection of stored records down to
/// the externally safe [`PublicUser`] shape. Authorization does not live
/// here; both transport adapters decide it (identically) before calling in.
use crate::db;
use crate::error::Result;
use crate::models::{CreateUser, PublicUser, UpdateUser};
use sqlx::PgPool;
use uuid::Uuid;

/// Parse a textual account id. Structurally invalid ids resolve to `None`
/// (operations on them report not-found rather than a parse error).
pub fn parse_user_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_users(&self, skip: i64, limit: i64) -> Result<Vec<PublicUser>> {
        let users = db::users::find_all(&self.pool, skip, limit).await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<PublicUser>> {
        let Some(id) = parse_user_id(id) else {
            return Ok(None);
        };
        let user = db::users::find_by_id(&self.pool, id).await?;
        Ok(user.map(PublicUser::from))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<PublicUser>> {
        let user = db::users::find_by_username(&self.pool, username).await?;
        Ok(user.map(PublicUser::from))
    }

    pub async fn create_user(&self, new_user: &CreateUser) -> Result<PublicUser> {
        let user = db::users::create(&self.pool, new_user).await?;
        Ok(PublicUser::from(user))
    }

    pub async fn update_user(&self, id: &str, fields: &UpdateUser) -> Result<Option<PublicUser>> {
        let Some(id) = parse_user_id(id) else {
            return Ok(None);
        };
        let user = db::users::update(&self.pool, id, fields).await?;
        Ok(user.map(PublicUser::from))
    }

    pub async fn delete_user(&self, id: &str) -> Result<bool> {
        let Some(id) = parse_user_id(id) else {
            return Ok(false);
        };
        db::users::delete(&self.pool, id).await
    }

    pub async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<PublicUser>> {
        let user = db::users::authenticate(&self.pool, username, password).await?;
        Ok(user.map(PublicUser::from))
    }
}
