/// Account repository for the identity service
///
/// Sole writer of stored accounts. Uniqueness of username/email is checked
/// here before every insert/update for a friendly error on the common path;
/// the UNIQUE constraints declared in the migration remain the
/// authoritative guard against the check-then-act race (see error.rs for
/// the constraint-violation mapping). Callers must treat the duplicate
/// errors as possible even after a prior successful check.
use crate::error::{IdentityError, Result};
use crate::models::{CreateUser, UpdateUser, User};
use crate::security::password::{hash_password, verify_password};
use sqlx::PgPool;
use uuid::Uuid;

/// List accounts in insertion order with offset/limit pagination.
///
/// No ordering stability is guaranteed across concurrent mutation.
pub async fn find_all(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<User>> {
    let users =
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, id OFFSET $1 LIMIT $2")
            .bind(skip)
            .bind(limit)
            .fetch_all(pool)
            .await?;

    Ok(users)
}

/// Find account by id
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Find account by username. Includes the credential hash; internal use only.
pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Find account by email. Includes the credential hash; internal use only.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Check whether a username is taken by an account other than `exclude`
/// (the record's own id, during updates)
async fn username_taken(pool: &PgPool, username: &str, exclude: Uuid) -> Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id <> $2)",
    )
    .bind(username)
    .bind(exclude)
    .fetch_one(pool)
    .await?;

    Ok(taken)
}

/// Check whether an email is taken by an account other than `exclude`
async fn email_taken(pool: &PgPool, email: &str, exclude: Uuid) -> Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
    )
    .bind(email)
    .bind(exclude)
    .fetch_one(pool)
    .await?;

    Ok(taken)
}

/// Create a new account
///
/// The username check runs before the email check, so when both collide the
/// reported cause is the username.
pub async fn create(pool: &PgPool, new_user: &CreateUser) -> Result<User> {
    if find_by_username(pool, &new_user.username).await?.is_some() {
        return Err(IdentityError::DuplicateUsername);
    }
    if find_by_email(pool, &new_user.email).await?.is_some() {
        return Err(IdentityError::DuplicateEmail);
    }

    let password_hash = hash_password(&new_user.password);

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, role, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(new_user.role)
    .bind(&password_hash)
    .fetch_one(pool)
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "Account created");

    Ok(user)
}

/// Patch an existing account
///
/// Only fields present in `fields` are applied; uniqueness is re-checked
/// for changed identity fields excluding the account's own record, and a
/// new secret is re-hashed. Returns `None` if `id` does not resolve.
pub async fn update(pool: &PgPool, id: Uuid, fields: &UpdateUser) -> Result<Option<User>> {
    if let Some(username) = &fields.username {
        if username_taken(pool, username, id).await? {
            return Err(IdentityError::DuplicateUsername);
        }
    }
    if let Some(email) = &fields.email {
        if email_taken(pool, email, id).await? {
            return Err(IdentityError::DuplicateEmail);
        }
    }

    let password_hash = fields.password.as_deref().map(hash_password);

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET
            username = COALESCE($2, username),
            email = COALESCE($3, email),
            role = COALESCE($4, role),
            password_hash = COALESCE($5, password_hash)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&fields.username)
    .bind(&fields.email)
    .bind(fields.role)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Hard-delete an account. Returns whether a record existed and was removed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Verify a username/secret pair
///
/// Fails closed: not-found and credential mismatch are indistinguishable to
/// the caller, both returning `None`.
pub async fn authenticate(pool: &PgPool, username: &str, password: &str) -> Result<Option<User>> {
    let Some(user) = find_by_username(pool, username).await? else {
        return Ok(None);
    };

    if verify_password(&user.password_hash, password)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}
