//! Final status and body decision for a completed request.

use axum::{
    extract::{Query, Request},
    http::{Method, StatusCode},
};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::cache::{self, CacheStore};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::middleware::response::ResponseContext;
use crate::sanitize::Node;

pub const ID_MUST_BE_NUMBER: &str = "ID parameter must be a number";

/// The parts of a request the output pipeline looks at.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    /// Mount path of the router handling the request
    pub base_url: String,
    /// Path below `base_url`
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Cache generation observed before the handler ran
    pub cache_generation: u64,
}

impl RequestInfo {
    pub fn new(method: Method, base_url: &str, path: &str, query: Vec<(String, String)>) -> Self {
        Self {
            method,
            base_url: base_url.to_string(),
            path: path.to_string(),
            query,
            cache_generation: 0,
        }
    }

    pub fn at_generation(mut self, generation: u64) -> Self {
        self.cache_generation = generation;
        self
    }

    pub fn from_request(request: &Request, base_url: &str) -> Self {
        let query = Query::<Vec<(String, String)>>::try_from_uri(request.uri())
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();
        Self::new(
            request.method().clone(),
            base_url,
            request.uri().path(),
            query,
        )
    }

    pub fn cache_key(&self) -> String {
        cache::key(
            &self.base_url,
            &self.path,
            self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    /// Whether the last path segment is an integer id
    pub fn has_numeric_id(&self) -> bool {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .is_some_and(|segment| segment.parse::<i64>().is_ok())
    }
}

/// Status for a method, given whether the handler produced content.
///
/// Content always gets a status; HEAD answers like GET and methods outside
/// the table answer 200. `None` means no response of its own for an empty
/// result.
pub fn status_for(method: &Method, has_content: bool) -> Option<StatusCode> {
    match (method.as_str(), has_content) {
        ("DELETE", _) => Some(StatusCode::NO_CONTENT),
        ("POST", true) => Some(StatusCode::CREATED),
        ("POST" | "PUT" | "PATCH", false) => Some(StatusCode::NO_CONTENT),
        (_, true) => Some(StatusCode::OK),
        (_, false) => None,
    }
}

#[derive(Debug, PartialEq)]
pub enum Resolution {
    Respond {
        status: StatusCode,
        body: Option<Value>,
    },
    /// Nothing to write; hand over to the not-found path
    Defer,
    Fail(ApiError),
}

/// Decides what a finished handler result turns into and memoizes
/// cacheable reads.
pub struct Resolver {
    cache: Arc<CacheStore>,
    ttl_secs: u64,
    json_content: bool,
}

impl Resolver {
    pub fn new(config: &AppConfig, cache: Arc<CacheStore>) -> Self {
        Self {
            cache,
            ttl_secs: config.cache.ttl_secs,
            json_content: config.api.json_content,
        }
    }

    pub fn resolve(&self, request: &RequestInfo, context: ResponseContext) -> Resolution {
        let has_content = context.has_content();

        if request.method == Method::DELETE {
            if !request.has_numeric_id() {
                return Resolution::Fail(ApiError::expectation_failed(ID_MUST_BE_NUMBER));
            }
            return Resolution::Respond {
                status: StatusCode::NO_CONTENT,
                body: None,
            };
        }

        if !has_content {
            return Resolution::Defer;
        }

        let Some(status) = status_for(&request.method, true) else {
            return Resolution::Defer;
        };

        let data = context.data.as_ref().map(Node::to_json).unwrap_or(Value::Null);
        let body = envelope(data, context.meta);

        // Skipped when a write refreshed the cache while the handler ran.
        if !context.private && self.json_content && self.cache.is_cachable(&request.method) {
            self.cache.put_since(
                request.cache_key(),
                body.clone(),
                self.ttl_secs,
                request.cache_generation,
            );
        }

        Resolution::Respond {
            status,
            body: Some(body),
        }
    }
}

/// `data`, or `{ data, ...meta }` when meta is present
fn envelope(data: Value, meta: Option<Map<String, Value>>) -> Value {
    match meta {
        None => data,
        Some(meta) => {
            let mut body = Map::new();
            body.insert("data".to_string(), data);
            body.extend(meta);
            Value::Object(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use serde_json::json;

    fn resolver(cache_active: bool) -> (Resolver, Arc<CacheStore>) {
        let mut config = AppConfig::preset(Environment::Development);
        config.cache.is_active = cache_active;
        config.cache.ttl_secs = 60;
        let cache = Arc::new(CacheStore::new(&config.cache));
        (Resolver::new(&config, cache.clone()), cache)
    }

    fn request(method: Method, path: &str) -> RequestInfo {
        RequestInfo::new(method, "", path, vec![])
    }

    #[test]
    fn status_table() {
        assert_eq!(status_for(&Method::POST, true), Some(StatusCode::CREATED));
        assert_eq!(status_for(&Method::POST, false), Some(StatusCode::NO_CONTENT));
        assert_eq!(status_for(&Method::DELETE, true), Some(StatusCode::NO_CONTENT));
        assert_eq!(status_for(&Method::DELETE, false), Some(StatusCode::NO_CONTENT));
        assert_eq!(status_for(&Method::GET, true), Some(StatusCode::OK));
        assert_eq!(status_for(&Method::GET, false), None);
        assert_eq!(status_for(&Method::PUT, true), Some(StatusCode::OK));
        assert_eq!(status_for(&Method::PATCH, false), Some(StatusCode::NO_CONTENT));
        assert_eq!(status_for(&Method::HEAD, true), Some(StatusCode::OK));
        assert_eq!(status_for(&Method::HEAD, false), None);
        assert_eq!(status_for(&Method::OPTIONS, true), Some(StatusCode::OK));
        assert_eq!(status_for(&Method::OPTIONS, false), None);
    }

    #[test]
    fn delete_with_numeric_id_is_204_without_body() {
        let (r, _) = resolver(false);
        let res = r.resolve(&request(Method::DELETE, "/users/12"), ResponseContext::empty());
        assert_eq!(
            res,
            Resolution::Respond {
                status: StatusCode::NO_CONTENT,
                body: None
            }
        );
    }

    #[test]
    fn delete_with_malformed_id_fails_417() {
        let (r, _) = resolver(false);
        let res = r.resolve(&request(Method::DELETE, "/users/abc"), ResponseContext::empty());
        assert_eq!(res, Resolution::Fail(ApiError::expectation_failed(ID_MUST_BE_NUMBER)));
    }

    #[test]
    fn no_content_defers() {
        let (r, _) = resolver(true);
        let res = r.resolve(&request(Method::GET, "/users/1"), ResponseContext::empty());
        assert_eq!(res, Resolution::Defer);
        let res = r.resolve(
            &request(Method::POST, "/users"),
            ResponseContext::success(Node::null()),
        );
        assert_eq!(res, Resolution::Defer);
    }

    #[test]
    fn post_with_content_is_201() {
        let (r, cache) = resolver(true);
        let res = r.resolve(
            &request(Method::POST, "/users"),
            ResponseContext::success(Node::from(json!({ "id": 1 }))),
        );
        assert_eq!(
            res,
            Resolution::Respond {
                status: StatusCode::CREATED,
                body: Some(json!({ "id": 1 }))
            }
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn content_is_answered_for_every_method() {
        let (r, cache) = resolver(true);
        let res = r.resolve(&request(Method::POST, "/auth/login"), ResponseContext::success("ok"));
        assert_eq!(
            res,
            Resolution::Respond {
                status: StatusCode::CREATED,
                body: Some(json!("ok"))
            }
        );

        for method in [Method::HEAD, Method::OPTIONS] {
            let res = r.resolve(&request(method.clone(), "/users"), ResponseContext::success("x"));
            assert_eq!(
                res,
                Resolution::Respond {
                    status: StatusCode::OK,
                    body: Some(json!("x"))
                },
                "{}",
                method
            );
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn meta_is_spread_next_to_data() {
        let (r, _) = resolver(false);
        let ctx = ResponseContext::paginated(
            Node::from(json!([1, 2])),
            crate::database::Page {
                page: 1,
                per_page: 2,
            },
            5,
        );
        match r.resolve(&request(Method::GET, "/users"), ctx) {
            Resolution::Respond { body, .. } => assert_eq!(
                body,
                Some(json!({
                    "data": [1, 2],
                    "pagination": { "page": 1, "per_page": 2, "total": 5 }
                }))
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cacheable_get_is_stored_under_request_key() {
        let (r, cache) = resolver(true);
        let req = RequestInfo::new(
            Method::GET,
            "",
            "/users",
            vec![("role".to_string(), "admin".to_string())],
        );
        r.resolve(&req, ResponseContext::success(Node::from(json!([{ "id": 1 }]))));

        let expected_key = format!("__mcache_/users?q={}", cache::query_digest([("role", "admin")]));
        assert_eq!(req.cache_key(), expected_key);
        assert_eq!(cache.get(&expected_key), Some(json!([{ "id": 1 }])));
    }

    #[test]
    fn private_context_is_not_cached() {
        let (r, cache) = resolver(true);
        r.resolve(
            &request(Method::GET, "/medias"),
            ResponseContext::success("x").private(),
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn read_overtaken_by_a_refresh_is_not_cached() {
        let (r, cache) = resolver(true);
        let req = request(Method::GET, "/users").at_generation(cache.generation());
        cache.refresh("users");
        r.resolve(&req, ResponseContext::success("stale"));
        assert!(cache.is_empty());
    }

    #[test]
    fn huge_ttl_is_cached() {
        let mut config = AppConfig::preset(Environment::Development);
        config.cache.is_active = true;
        config.cache.ttl_secs = u64::MAX;
        let cache = Arc::new(CacheStore::new(&config.cache));
        let r = Resolver::new(&config, cache.clone());

        r.resolve(&request(Method::GET, "/users"), ResponseContext::success("x"));
        assert_eq!(cache.get(&request(Method::GET, "/users").cache_key()), Some(json!("x")));
    }

    #[test]
    fn nothing_is_cached_when_disabled() {
        let (r, cache) = resolver(false);
        r.resolve(&request(Method::GET, "/users"), ResponseContext::success("x"));
        assert!(cache.is_empty());
    }

    #[test]
    fn numeric_id_detection() {
        assert!(request(Method::DELETE, "/medias/3/").has_numeric_id());
        assert!(!request(Method::DELETE, "/medias/three").has_numeric_id());
        assert!(!request(Method::DELETE, "/").has_numeric_id());
    }
}
