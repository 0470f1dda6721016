use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Map, Value};

use crate::database::Page;
use crate::error::ApiError;
use crate::sanitize::Node;

/// Result of a handler, handed to the output pipeline.
///
/// Handlers never serialize their own bodies. They return the data (and
/// optional pagination meta) through this value; the sanitize layer filters
/// `data` and the resolve layer picks the status from the request method.
#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    pub data: Option<Node>,
    pub meta: Option<Map<String, Value>>,
    /// Data depends on the caller, so it must never be cached
    pub private: bool,
}

impl ResponseContext {
    /// Context carrying `data`
    pub fn success(data: impl Into<Node>) -> Self {
        Self {
            data: Some(data.into()),
            ..Default::default()
        }
    }

    /// Context with no content; the resolver defers it to the not-found path
    pub fn empty() -> Self {
        Self::default()
    }

    /// `Some` becomes content, `None` an empty context
    pub fn found<T: Into<Node>>(data: Option<T>) -> Self {
        match data {
            Some(data) => Self::success(data),
            None => Self::empty(),
        }
    }

    /// List data with `{ "pagination": { page, per_page, total } }` meta
    pub fn paginated(data: impl Into<Node>, page: Page, total: i64) -> Self {
        let mut meta = Map::new();
        meta.insert(
            "pagination".to_string(),
            json!({
                "page": page.page,
                "per_page": page.per_page,
                "total": total,
            }),
        );
        Self::success(data).with_meta(meta)
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn has_content(&self) -> bool {
        self.data.as_ref().is_some_and(|data| !data.is_null())
    }
}

impl IntoResponse for ResponseContext {
    fn into_response(self) -> Response {
        let mut response = StatusCode::OK.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

// Convenience type alias
pub type ApiResult = Result<ResponseContext, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_data_is_not_content() {
        assert!(!ResponseContext::success(Node::null()).has_content());
        assert!(!ResponseContext::found(Option::<Node>::None).has_content());
        assert!(ResponseContext::success("x").has_content());
    }

    #[test]
    fn context_travels_in_response_extensions() {
        let response = ResponseContext::success("x").private().into_response();
        let context = response.extensions().get::<ResponseContext>().unwrap();
        assert!(context.private);
        assert_eq!(context.data, Some(Node::from("x")));
    }

    #[test]
    fn paginated_sets_meta() {
        let page = Page {
            page: 2,
            per_page: 10,
        };
        let ctx = ResponseContext::paginated(Node::Array(vec![]), page, 11);
        assert_eq!(
            Value::Object(ctx.meta.unwrap()),
            json!({ "pagination": { "page": 2, "per_page": 10, "total": 11 } })
        );
    }
}
