use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::app::AppState;
use crate::database::Role;
use crate::error::ApiError;

/// Token subject confirmed against the users table
#[derive(Clone, Debug)]
pub struct ValidatedUser {
    pub id: i64,
    pub username: String,
    /// Current role from storage, which wins over the role in the token
    pub role: Role,
}

impl ValidatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Administrator role required"))
        }
    }

    pub fn require_self_or_admin(&self, user_id: i64) -> Result<(), ApiError> {
        if self.is_admin() || self.id == user_id {
            Ok(())
        } else {
            Err(ApiError::forbidden("Access to another user's account is not allowed"))
        }
    }
}

/// Middleware that checks the JWT subject still exists
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let user = state.users.find(auth_user.id).await?.ok_or_else(|| {
        tracing::warn!("User validation failed: user {} no longer exists", auth_user.id);
        ApiError::unauthorized("User no longer exists")
    })?;

    if user.role != auth_user.role {
        tracing::debug!(
            "Role of user {} changed from {} to {} since token issue",
            user.id,
            auth_user.role,
            user.role
        );
    }

    request.extensions_mut().insert(ValidatedUser {
        id: user.id,
        username: user.username,
        role: user.role,
    });

    Ok(next.run(request).await)
}
