use super::AppState;
use crate::error::{IdentityError, Result};
use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};

/// Login form (username/password, form-encoded)
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

/// `POST /token` - verify credentials and issue an access token.
///
/// Public. A failed login is 401 with a generic message; whether the
/// username or the password was wrong is not revealed.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<Token>> {
    let user = state
        .service
        .authenticate_user(&form.username, &form.password)
        .await?
        .ok_or(IdentityError::InvalidCredentials)?;

    let access_token = state.tokens.issue(&user.username)?;

    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
