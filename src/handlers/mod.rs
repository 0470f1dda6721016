// handlers/mod.rs - HTTP handlers grouped by security tier
//
// Public (no auth) -> Protected (JWT auth + user validation + route guards)
//
// Handlers return `ResponseContext`; the sanitize and resolve layers turn it
// into the response body and status.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode, Uri},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::Page;
use crate::error::ApiError;

pub mod protected;
pub mod public;

/// Error answered when nothing handled the request
pub fn not_found(path: &str) -> ApiError {
    ApiError::not_found(format!("Resource not found: {}", path))
}

pub async fn fallback(uri: Uri) -> ApiError {
    not_found(uri.path())
}

/// Numeric `:id` path parameter
#[derive(Debug, Clone, Copy)]
pub struct Id(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Id {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        raw.parse()
            .map(Id)
            .map_err(|_| ApiError::bad_request(crate::resolver::ID_MUST_BE_NUMBER))
    }
}

/// `?page=&per_page=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn page(&self, state: &AppState) -> Page {
        Page::new(
            self.page,
            self.per_page,
            state.config.api.default_per_page,
            state.config.api.max_per_page,
        )
    }
}

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let base = &state.config.api.base_path;
    Json(json!({
        "name": "Media API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health (public)",
            "auth": format!("{}/auth/register, {}/auth/login, {}/auth/refresh (public)", base, base, base),
            "users": format!("{}/users[/:id[/medias]] (protected)", base),
            "medias": format!("{}/medias[/:id] (protected)", base),
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.users.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok",
                "cache": {
                    "active": state.cache.is_active(),
                    "entries": state.cache.len(),
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable",
                })),
            )
        }
    }
}

/// Shape checks shared by the account handlers
pub(crate) mod validation {
    use crate::error::ApiError;

    pub fn username(value: &str) -> Result<(), ApiError> {
        let len = value.chars().count();
        if !(3..=64).contains(&len) {
            return Err(ApiError::invalid_field("username", "must be 3 to 64 characters"));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(ApiError::invalid_field(
                "username",
                "may only contain letters, digits, '_', '-' and '.'",
            ));
        }
        Ok(())
    }

    pub fn email(value: &str) -> Result<(), ApiError> {
        match value.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
            _ => Err(ApiError::invalid_field("email", "must be a valid email address")),
        }
    }

    pub fn password(value: &str) -> Result<(), ApiError> {
        if value.chars().count() < 8 {
            return Err(ApiError::invalid_field("password", "must be at least 8 characters"));
        }
        Ok(())
    }

    pub fn filename(value: &str) -> Result<(), ApiError> {
        if value.trim().is_empty() || value.contains(['/', '\\']) || value == ".." {
            return Err(ApiError::invalid_field("filename", "must be a plain file name"));
        }
        Ok(())
    }

    pub fn size(value: i64) -> Result<(), ApiError> {
        if value < 0 {
            return Err(ApiError::invalid_field("size", "must not be negative"));
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn accepts_reasonable_input() {
            assert!(username("ada_l").is_ok());
            assert!(email("ada@example.com").is_ok());
            assert!(password("long enough").is_ok());
            assert!(filename("cat.jpg").is_ok());
        }

        #[test]
        fn rejects_malformed_input() {
            assert!(username("a").is_err());
            assert!(username("no spaces").is_err());
            assert!(email("nope").is_err());
            assert!(email("@example.com").is_err());
            assert!(password("short").is_err());
            assert!(filename("../etc/passwd").is_err());
            assert!(size(-1).is_err());
        }
    }
}
