// handlers/protected/users/record.rs - /users/:id (self or administrator)

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{PatchUserRequest, ReplaceUserRequest};
use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::{validation, Id};
use crate::middleware::{ApiResult, ResponseContext, ValidatedUser};
use crate::sanitize::Node;
use crate::services::UserUpdate;

/// GET /users/:id - the user with their medias embedded
pub async fn get(State(state): State<AppState>, Id(id): Id) -> ApiResult {
    Ok(ResponseContext::found(state.users.get(id).await?))
}

/// GET /users/:id/medias
pub async fn medias(State(state): State<AppState>, Id(id): Id) -> ApiResult {
    let medias = state.users.medias_of(id).await?;
    Ok(ResponseContext::found(medias.map(|m| Node::list(m))))
}

/// PUT /users/:id
pub async fn put(
    State(state): State<AppState>,
    Extension(caller): Extension<ValidatedUser>,
    Id(id): Id,
    Json(body): Json<ReplaceUserRequest>,
) -> ApiResult {
    update(&state, &caller, id, body.into()).await
}

/// PATCH /users/:id
pub async fn patch(
    State(state): State<AppState>,
    Extension(caller): Extension<ValidatedUser>,
    Id(id): Id,
    Json(body): Json<PatchUserRequest>,
) -> ApiResult {
    update(&state, &caller, id, body).await
}

async fn update(
    state: &AppState,
    caller: &ValidatedUser,
    id: i64,
    body: PatchUserRequest,
) -> ApiResult {
    if let Some(username) = &body.username {
        validation::username(username)?;
    }
    if let Some(email) = &body.email {
        validation::email(email)?;
    }
    if let Some(password) = &body.password {
        validation::password(password)?;
    }
    if body.role.is_some() && !caller.is_admin() {
        return Err(ApiError::forbidden("Only administrators can change roles"));
    }

    let user = state
        .users
        .update(
            id,
            UserUpdate {
                username: body.username,
                email: body.email,
                password: body.password,
                role: body.role,
            },
        )
        .await?;
    Ok(ResponseContext::success(user))
}

/// DELETE /users/:id - removes the user and their medias.
///
/// A non-numeric id deletes nothing; the resolver answers it with 417.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if let Ok(id) = id.parse::<i64>() {
        state.users.delete(id).await?;
    }
    Ok(ResponseContext::empty())
}
