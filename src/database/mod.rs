//! Persistence for users and medias.
//!
//! Handlers and services only see the repository traits. Two backends
//! implement them: Postgres through `sqlx`, and an in-memory store for
//! development and tests.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::{MemoryMediaRepository, MemoryUserRepository};
pub use models::{Media, MediaChanges, NewMedia, NewUser, Role, User, UserChanges, UserFilter};
pub use postgres::{PgMediaRepository, PgUserRepository};

/// Errors from the repositories
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32, max: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, max.max(1)),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 25,
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Matching users for one page, plus the total number of matches
    async fn list(&self, filter: &UserFilter, page: Page) -> Result<(Vec<User>, i64), StoreError>;

    async fn find(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Lookup by username or email
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn list(&self, owner_id: Option<i64>, page: Page) -> Result<(Vec<Media>, i64), StoreError>;

    async fn by_owner(&self, owner_id: i64) -> Result<Vec<Media>, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<Media>, StoreError>;

    async fn create(&self, media: NewMedia) -> Result<Media, StoreError>;

    async fn update(&self, id: i64, changes: MediaChanges) -> Result<Media, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Remove every media owned by `owner_id`, returning how many were removed
    async fn delete_by_owner(&self, owner_id: i64) -> Result<u64, StoreError>;
}
