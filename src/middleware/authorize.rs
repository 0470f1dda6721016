//! Route guards.
//!
//! Guards sit between user validation and the cache read layer, so a cached
//! response is only ever served to a caller allowed to see it.

use axum::{
    extract::{Path, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
    Extension,
};
use std::collections::HashMap;

use super::validate_user::ValidatedUser;
use crate::app::AppState;
use crate::error::ApiError;

fn numeric_id(params: &HashMap<String, String>) -> Option<i64> {
    params.get("id").and_then(|id| id.parse().ok())
}

pub async fn require_admin(
    Extension(user): Extension<ValidatedUser>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    user.require_admin()?;
    Ok(next.run(request).await)
}

/// `/users/:id` routes: deletes need an administrator, everything else the
/// account owner or an administrator
pub async fn user_access(
    Extension(user): Extension<ValidatedUser>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::DELETE {
        user.require_admin()?;
    } else if let Some(id) = numeric_id(&params) {
        user.require_self_or_admin(id)?;
    }
    Ok(next.run(request).await)
}

/// `/medias/:id` routes: the owner of the media or an administrator
pub async fn media_access(
    State(state): State<AppState>,
    Extension(user): Extension<ValidatedUser>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !user.is_admin() {
        if let Some(id) = numeric_id(&params) {
            if let Some(media) = state.medias.get(id).await? {
                if media.owner_id != user.id {
                    return Err(ApiError::forbidden("Media belongs to another user"));
                }
            }
        }
    }
    Ok(next.run(request).await)
}
