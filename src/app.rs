//! Application state and router assembly.

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, warn};

use crate::auth::{AuthError, JwtKeys};
use crate::cache::CacheStore;
use crate::config::{AppConfig, SecurityConfig};
use crate::database::{MediaRepository, MemoryMediaRepository, MemoryUserRepository, UserRepository};
use crate::handlers;
use crate::middleware::{
    authorize, cache_read_middleware, jwt_auth_middleware, json_error_middleware,
    resolve_middleware, sanitize_middleware, validate_user_middleware,
};
use crate::resolver::Resolver;
use crate::services::{MediaService, UserService};

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: Arc<CacheStore>,
    pub resolver: Arc<Resolver>,
    pub keys: JwtKeys,
    pub users: UserService,
    pub medias: MediaService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        medias: Arc<dyn MediaRepository>,
    ) -> Result<Self, AuthError> {
        let keys = JwtKeys::new(&config.security)?;
        let cache = Arc::new(CacheStore::new(&config.cache));
        let resolver = Arc::new(Resolver::new(&config, cache.clone()));

        Ok(Self {
            users: UserService::new(users.clone(), medias.clone(), cache.clone()),
            medias: MediaService::new(medias, users, cache.clone()),
            config: Arc::new(config),
            cache,
            resolver,
            keys,
        })
    }

    /// State backed by the in-memory repositories
    pub fn in_memory(config: AppConfig) -> Result<Self, AuthError> {
        Self::new(
            config,
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryMediaRepository::new()),
        )
    }
}

/// Full application router.
///
/// The REST routes are mounted under the configured base path; `/` and
/// `/health` stay at the root.
pub fn app(state: AppState) -> Router {
    let api = api_routes(&state);
    let base_path = state.config.api.base_path.clone();

    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health));

    let router = if base_path.is_empty() {
        router.merge(api)
    } else {
        router.nest(&base_path, api)
    };

    router
        .fallback(handlers::fallback)
        .layer(from_fn(json_error_middleware))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// resolve wraps sanitize, so the resolver sees filtered data
fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_public_routes())
        .merge(user_routes(state))
        .merge(media_routes(state))
        .layer(from_fn_with_state(state.clone(), sanitize_middleware))
        .layer(from_fn_with_state(state.clone(), resolve_middleware))
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
        .route("/auth/refresh", post(auth::refresh_post))
}

fn user_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::users;

    let collection = Router::new()
        .route(
            "/users",
            get(users::collection_get).post(users::collection_post),
        )
        .route_layer(from_fn_with_state(state.clone(), cache_read_middleware))
        .route_layer(from_fn(authorize::require_admin));

    let records = Router::new()
        .route(
            "/users/:id",
            get(users::record_get)
                .put(users::record_put)
                .patch(users::record_patch)
                .delete(users::record_delete),
        )
        .route("/users/:id/medias", get(users::record_medias))
        .route_layer(from_fn_with_state(state.clone(), cache_read_middleware))
        .route_layer(from_fn(authorize::user_access));

    authenticated(collection.merge(records), state)
}

fn media_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::medias;

    let collection = Router::new()
        .route(
            "/medias",
            get(medias::collection_get).post(medias::collection_post),
        )
        .route_layer(from_fn_with_state(state.clone(), cache_read_middleware));

    let records = Router::new()
        .route(
            "/medias/:id",
            get(medias::record_get)
                .put(medias::record_put)
                .patch(medias::record_patch)
                .delete(medias::record_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), cache_read_middleware))
        .route_layer(from_fn_with_state(state.clone(), authorize::media_access));

    authenticated(collection.merge(records), state)
}

fn authenticated(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes
        .route_layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    if config.cors_origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

/// Periodically drop expired cache entries so unread keys do not pile up
pub fn spawn_cache_janitor(cache: Arc<CacheStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!("Purged {} expired cache entries", purged);
            }
        }
    })
}
