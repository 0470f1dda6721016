// handlers/public/auth/refresh.rs - POST /auth/refresh

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::TokenKind;
use crate::error::ApiError;
use crate::middleware::{ApiResult, ResponseContext};
use crate::sanitize::Node;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Issue a fresh token pair from a refresh token
pub async fn refresh_post(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult {
    let claims = state.keys.verify(&body.refresh_token, TokenKind::Refresh)?;
    let user = state
        .users
        .find(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    let token = state.keys.issue(user.id, user.role)?;
    Ok(ResponseContext::success(Node::object([(
        "token",
        Node::scalar(&token),
    )])))
}
