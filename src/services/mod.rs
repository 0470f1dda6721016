// services/mod.rs - Domain operations behind the HTTP handlers
//
// Services own the repositories and the cache store. Every write goes through
// a service so the cached reads it affects are dropped in the same place.

use thiserror::Error;

use crate::auth::AuthError;
use crate::database::StoreError;
use crate::error::ApiError;

pub mod media_service;
pub mod user_service;

pub use media_service::{MediaService, MediaUpload};
pub use user_service::{Registration, UserService, UserUpdate};

/// Cache path segment covering user routes
pub const USERS_SEGMENT: &str = "users";
/// Cache path segment covering media routes
pub const MEDIAS_SEGMENT: &str = "medias";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0} does not exist")]
    MissingOwner(i64),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => e.into(),
            ServiceError::Auth(e) => e.into(),
            ServiceError::MissingOwner(id) => {
                ApiError::invalid_field("owner_id", format!("user {} does not exist", id))
            }
        }
    }
}
