use std::sync::Arc;
use tracing::info;

use super::{ServiceError, MEDIAS_SEGMENT, USERS_SEGMENT};
use crate::cache::CacheStore;
use crate::database::{Media, MediaChanges, MediaRepository, NewMedia, Page, UserRepository};

/// Metadata of an uploaded file
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    /// Public location; derived from the storage path when absent
    pub url: Option<String>,
}

/// Storage location of an owner's file
pub fn storage_path(owner_id: i64, filename: &str) -> String {
    format!("uploads/{}/{}", owner_id, filename)
}

#[derive(Clone)]
pub struct MediaService {
    medias: Arc<dyn MediaRepository>,
    users: Arc<dyn UserRepository>,
    cache: Arc<CacheStore>,
}

impl MediaService {
    pub fn new(
        medias: Arc<dyn MediaRepository>,
        users: Arc<dyn UserRepository>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            medias,
            users,
            cache,
        }
    }

    /// One page of medias, optionally restricted to an owner
    pub async fn list(&self, owner_id: Option<i64>, page: Page) -> Result<(Vec<Media>, i64), ServiceError> {
        Ok(self.medias.list(owner_id, page).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Media>, ServiceError> {
        Ok(self.medias.find(id).await?)
    }

    pub async fn create(&self, owner_id: i64, upload: MediaUpload) -> Result<Media, ServiceError> {
        if self.users.find(owner_id).await?.is_none() {
            return Err(ServiceError::MissingOwner(owner_id));
        }

        let storage_path = storage_path(owner_id, &upload.filename);
        let url = upload.url.unwrap_or_else(|| format!("/{}", storage_path));
        let media = self
            .medias
            .create(NewMedia {
                owner_id,
                filename: upload.filename,
                mimetype: upload.mimetype,
                size: upload.size,
                url,
                storage_path,
            })
            .await?;

        info!("Stored media {} for user {}", media.id, owner_id);
        self.invalidate();
        Ok(media)
    }

    pub async fn update(&self, id: i64, changes: MediaChanges) -> Result<Media, ServiceError> {
        let media = self.medias.update(id, changes).await?;
        self.invalidate();
        Ok(media)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.medias.delete(id).await?;
        self.invalidate();
        Ok(())
    }

    // User reads embed their medias, so both segments go stale together
    fn invalidate(&self) {
        self.cache.refresh(MEDIAS_SEGMENT);
        self.cache.refresh(USERS_SEGMENT);
    }
}
