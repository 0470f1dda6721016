//! In-memory response cache.
//!
//! GET responses are memoized under a key derived from the request path and
//! its query values, and invalidated in bulk by key segment whenever the
//! service layer writes to the underlying resource.

pub mod keys;
mod lock;
mod store;

pub use keys::{key, query_digest, KEY_PREFIX};
pub use store::CacheStore;
