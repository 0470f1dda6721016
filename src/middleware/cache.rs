use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::app::AppState;
use crate::resolver::RequestInfo;

/// Serve cacheable reads from the cache store.
///
/// On a hit the stored body is answered with 200 and the handler never runs.
/// Falsy bodies (`null`, `false`, `0`, `""`) count as a miss.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn cache_read_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.api.json_content || !state.cache.is_cachable(request.method()) {
        return next.run(request).await;
    }

    let key = RequestInfo::from_request(&request, &state.config.api.base_path).cache_key();
    match state.cache.get(&key).filter(is_truthy) {
        Some(cached) => {
            debug!(cache_key = %key, outcome = "hit", "response cache");
            (StatusCode::OK, Json(cached)).into_response()
        }
        None => {
            debug!(cache_key = %key, outcome = "miss", "response cache");
            next.run(request).await
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
