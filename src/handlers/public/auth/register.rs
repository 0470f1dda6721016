// handlers/public/auth/register.rs - POST /auth/register

use axum::{extract::State, Json};
use serde::Deserialize;

use super::session;
use crate::app::AppState;
use crate::database::Role;
use crate::handlers::validation;
use crate::middleware::{ApiResult, ResponseContext};
use crate::services::Registration;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Create a regular account and sign the new user in (201)
pub async fn register_post(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult {
    validation::username(&body.username)?;
    validation::email(&body.email)?;
    validation::password(&body.password)?;

    let user = state
        .users
        .register(Registration {
            username: body.username,
            email: body.email,
            password: body.password,
            role: Role::User,
        })
        .await?;

    let token = state.keys.issue(user.id, user.role)?;
    Ok(ResponseContext::success(session(&token, &user)))
}
