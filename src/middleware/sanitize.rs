use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use super::response::ResponseContext;
use crate::app::AppState;
use crate::sanitize::{has_eligible_member, sanitize};

/// Filter handler data through entity whitelists before it is resolved
pub async fn sanitize_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let skip = request.method() == Method::DELETE || !state.config.api.json_content;
    let mut response = next.run(request).await;
    if skip {
        return response;
    }

    if let Some(context) = response.extensions_mut().get_mut::<ResponseContext>() {
        if let Some(data) = context.data.take() {
            context.data = Some(if has_eligible_member(&data) {
                sanitize(data)
            } else {
                data
            });
        }
    }
    response
}
