// handlers/public/auth/login.rs - POST /auth/login

use axum::{extract::State, Json};
use serde::Deserialize;

use super::session;
use crate::app::AppState;
use crate::middleware::{ApiResult, ResponseContext};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

/// Exchange credentials for a token pair
pub async fn login_post(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult {
    let user = state.users.authenticate(&body.login, &body.password).await?;
    let token = state.keys.issue(user.id, user.role)?;

    tracing::info!("User {} logged in", user.username);
    Ok(ResponseContext::success(session(&token, &user)))
}
