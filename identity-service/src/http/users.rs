use super::{AppState, CurrentUser};
use crate::authz::{self, Actor, Operation};
use crate::error::{IdentityError, Result};
use crate::models::{CreateUser, PublicUser, UpdateUser};
use crate::service::users::parse_user_id;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

/// Offset/limit pagination query parameters
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl Pagination {
    fn bounds(&self) -> Result<(i64, i64)> {
        if self.skip < 0 {
            return Err(IdentityError::InvalidArgument(
                "skip must be non-negative".to_string(),
            ));
        }
        if !(1..=100).contains(&self.limit) {
            return Err(IdentityError::InvalidArgument(
                "limit must be between 1 and 100".to_string(),
            ));
        }
        Ok((self.skip, self.limit))
    }
}

/// `GET /users` - list accounts with pagination. Admin only.
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<PublicUser>>> {
    authz::require(Some(&Actor::from(&current)), &Operation::ListUsers)?;

    let (skip, limit) = page.bounds()?;
    let users = state.service.get_users(skip, limit).await?;

    Ok(Json(users))
}

/// `GET /users/{id}` - fetch one account. Admin or owner.
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>> {
    authz::require(
        Some(&Actor::from(&current)),
        &Operation::ReadUser {
            target: parse_user_id(&id),
        },
    )?;

    let user = state
        .service
        .get_user(&id)
        .await?
        .ok_or(IdentityError::NotFound)?;

    Ok(Json(user))
}

/// `GET /users/username/{username}` - fetch one account by username. Public.
pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicUser>> {
    let user = state
        .service
        .get_user_by_username(&username)
        .await?
        .ok_or(IdentityError::NotFound)?;

    Ok(Json(user))
}

/// `POST /users` - register a new account. Public.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUser>,
) -> Result<(StatusCode, Json<PublicUser>)> {
    body.validate()?;

    let user = state.service.create_user(&body).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /users/{id}` - patch an account. Admin or owner; role changes are
/// admin only and rejected here, before the service is invoked.
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateUser>,
) -> Result<Json<PublicUser>> {
    body.validate()?;

    authz::require(
        Some(&Actor::from(&current)),
        &Operation::UpdateUser {
            target: parse_user_id(&id),
            changes_role: body.role.is_some(),
        },
    )?;

    let user = state
        .service
        .update_user(&id, &body)
        .await?
        .ok_or(IdentityError::NotFound)?;

    Ok(Json(user))
}

/// `DELETE /users/{id}` - hard-delete an account. Admin or owner.
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    authz::require(
        Some(&Actor::from(&current)),
        &Operation::DeleteUser {
            target: parse_user_id(&id),
        },
    )?;

    if state.service.delete_user(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(IdentityError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let page = Pagination {
            skip: 0,
            limit: default_limit(),
        };
        assert_eq!(page.bounds().unwrap(), (0, 100));
    }

    #[test]
    fn test_pagination_rejects_out_of_range() {
        assert!(Pagination { skip: -1, limit: 10 }.bounds().is_err());
        assert!(Pagination { skip: 0, limit: 0 }.bounds().is_err());
        assert!(Pagination { skip: 0, limit: 101 }.bounds().is_err());
        assert!(Pagination { skip: 5, limit: 1 }.bounds().is_ok());
    }
}
