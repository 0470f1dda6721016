use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ServiceError, MEDIAS_SEGMENT, USERS_SEGMENT};
use crate::auth::{hash_password, verify_password, AuthError};
use crate::cache::CacheStore;
use crate::database::{
    Media, MediaRepository, NewUser, Page, Role, StoreError, User, UserChanges, UserFilter,
    UserRepository,
};

/// Account creation input; `password` is plain text
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Partial account update; `password` is plain text
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    medias: Arc<dyn MediaRepository>,
    cache: Arc<CacheStore>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        medias: Arc<dyn MediaRepository>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            users,
            medias,
            cache,
        }
    }

    pub async fn list(&self, filter: &UserFilter, page: Page) -> Result<(Vec<User>, i64), ServiceError> {
        Ok(self.users.list(filter, page).await?)
    }

    /// User with their medias embedded
    pub async fn get(&self, id: i64) -> Result<Option<User>, ServiceError> {
        let Some(user) = self.users.find(id).await? else {
            return Ok(None);
        };
        let medias = self.medias.by_owner(id).await?;
        Ok(Some(user.with_medias(medias)))
    }

    /// Medias of an existing user, `None` when the user is unknown
    pub async fn medias_of(&self, id: i64) -> Result<Option<Vec<Media>>, ServiceError> {
        if self.users.find(id).await?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.medias.by_owner(id).await?))
    }

    pub async fn register(&self, registration: Registration) -> Result<User, ServiceError> {
        let user = self
            .users
            .create(NewUser {
                username: registration.username,
                email: registration.email,
                password: hash_password(&registration.password)?,
                role: registration.role,
                api_key: Uuid::new_v4().simple().to_string(),
            })
            .await?;

        info!("Registered user {} ({})", user.username, user.role);
        self.cache.refresh(USERS_SEGMENT);
        Ok(user)
    }

    /// Create the bootstrap administrator unless the login is already taken.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, username: &str, email: &str, password: &str) -> Result<bool, ServiceError> {
        if self.users.find_by_login(username).await?.is_some() {
            return Ok(false);
        }
        self.register(Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::Admin,
        })
        .await?;
        Ok(true)
    }

    /// Check a username or email against its password
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, ServiceError> {
        let Some(user) = self.users.find_by_login(login).await? else {
            debug!("Login attempt for unknown account '{}'", login);
            return Err(AuthError::InvalidCredentials.into());
        };
        if !verify_password(password, &user.password)? {
            debug!("Wrong password for '{}'", login);
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(user)
    }

    /// Plain lookup without medias, used to re-check token subjects
    pub async fn find(&self, id: i64) -> Result<Option<User>, ServiceError> {
        Ok(self.users.find(id).await?)
    }

    pub async fn update(&self, id: i64, update: UserUpdate) -> Result<User, ServiceError> {
        let password = match update.password {
            Some(plain) => Some(hash_password(&plain)?),
            None => None,
        };
        let changes = UserChanges {
            username: update.username,
            email: update.email,
            password,
            role: update.role,
        };

        let user = self.users.update(id, changes).await?;
        self.cache.refresh(USERS_SEGMENT);
        Ok(user)
    }

    /// Delete a user together with every media they own
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if self.users.find(id).await?.is_none() {
            return Err(StoreError::NotFound(format!("user {} not found", id)).into());
        }
        let removed = self.medias.delete_by_owner(id).await?;
        self.users.delete(id).await?;

        info!("Deleted user {} and {} media(s)", id, removed);
        self.cache.refresh(USERS_SEGMENT);
        self.cache.refresh(MEDIAS_SEGMENT);
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(self.users.health_check().await?)
    }
}
