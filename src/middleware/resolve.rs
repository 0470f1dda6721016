use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use super::response::ResponseContext;
use crate::app::AppState;
use crate::handlers::not_found;
use crate::resolver::{RequestInfo, Resolution};

/// Turn the handler's `ResponseContext` into the final HTTP response.
///
/// Responses without a context (errors, cache hits) pass through untouched.
pub async fn resolve_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let info = RequestInfo::from_request(&request, &state.config.api.base_path)
        .at_generation(state.cache.generation());
    let mut response = next.run(request).await;

    let Some(context) = response.extensions_mut().remove::<ResponseContext>() else {
        return response;
    };

    match state.resolver.resolve(&info, context) {
        Resolution::Respond {
            status,
            body: Some(body),
        } => (status, Json(body)).into_response(),
        Resolution::Respond { status, body: None } => status.into_response(),
        Resolution::Defer => not_found(&info.path).into_response(),
        Resolution::Fail(err) => err.into_response(),
    }
}
