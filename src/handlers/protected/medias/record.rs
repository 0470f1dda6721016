// handlers/protected/medias/record.rs - /medias/:id (owner or administrator)

use axum::{
    extract::{Path, State},
    Json,
};

use super::{PatchMediaRequest, ReplaceMediaRequest};
use crate::app::AppState;
use crate::database::MediaChanges;
use crate::handlers::{validation, Id};
use crate::middleware::{ApiResult, ResponseContext};

pub async fn get(State(state): State<AppState>, Id(id): Id) -> ApiResult {
    Ok(ResponseContext::found(state.medias.get(id).await?))
}

pub async fn put(
    State(state): State<AppState>,
    Id(id): Id,
    Json(body): Json<ReplaceMediaRequest>,
) -> ApiResult {
    update(&state, id, body.into()).await
}

pub async fn patch(
    State(state): State<AppState>,
    Id(id): Id,
    Json(body): Json<PatchMediaRequest>,
) -> ApiResult {
    update(&state, id, body).await
}

async fn update(state: &AppState, id: i64, body: PatchMediaRequest) -> ApiResult {
    if let Some(filename) = &body.filename {
        validation::filename(filename)?;
    }
    if let Some(size) = body.size {
        validation::size(size)?;
    }

    let changes = MediaChanges {
        filename: body.filename,
        mimetype: body.mimetype,
        size: body.size,
        url: body.url,
    };
    Ok(ResponseContext::success(state.medias.update(id, changes).await?))
}

/// DELETE /medias/:id. A non-numeric id is left to the resolver (417).
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if let Ok(id) = id.parse::<i64>() {
        state.medias.delete(id).await?;
    }
    Ok(ResponseContext::empty())
}
