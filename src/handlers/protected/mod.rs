// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Middleware stack applied to every protected route, outermost first:
// jwt_auth -> validate_user -> route guard -> cache read -> handler
//
// Guards run before the cache read layer, so handlers may assume the caller
// is allowed to touch the addressed resource.

pub mod medias;
pub mod users;
