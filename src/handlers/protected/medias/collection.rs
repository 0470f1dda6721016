// handlers/protected/medias/collection.rs - GET, POST /medias

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::handlers::{validation, PageQuery};
use crate::middleware::{ApiResult, ResponseContext, ValidatedUser};
use crate::sanitize::Node;
use crate::services::MediaUpload;

/// GET /medias - administrators see every media, users their own.
///
/// The listing depends on the caller, so it is never cached.
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<ValidatedUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult {
    let page = query.page(&state);
    let owner = (!caller.is_admin()).then_some(caller.id);

    let (medias, total) = state.medias.list(owner, page).await?;
    Ok(ResponseContext::paginated(Node::list(medias), page, total).private())
}

#[derive(Debug, Deserialize)]
pub struct CreateMediaRequest {
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub url: Option<String>,
}

/// POST /medias - register a file owned by the caller
pub async fn post(
    State(state): State<AppState>,
    Extension(caller): Extension<ValidatedUser>,
    Json(body): Json<CreateMediaRequest>,
) -> ApiResult {
    validation::filename(&body.filename)?;
    validation::size(body.size)?;

    let media = state
        .medias
        .create(
            caller.id,
            MediaUpload {
                filename: body.filename,
                mimetype: body.mimetype,
                size: body.size,
                url: body.url,
            },
        )
        .await?;
    Ok(ResponseContext::success(media))
}
