pub mod auth;
pub mod authorize;
pub mod cache;
pub mod errors;
pub mod resolve;
pub mod response;
pub mod sanitize;
pub mod validate_user;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use cache::cache_read_middleware;
pub use errors::json_error_middleware;
pub use resolve::resolve_middleware;
pub use response::{ApiResult, ResponseContext};
pub use sanitize::sanitize_middleware;
pub use validate_user::{validate_user_middleware, ValidatedUser};
