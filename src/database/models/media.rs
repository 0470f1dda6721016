use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::sanitize::{Entity, Node, Whitelistable};

#[derive(Debug, Clone, FromRow)]
pub struct Media {
    pub id: i64,
    pub owner_id: i64,
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub url: String,
    /// Location of the binary on the storage backend; never sent to clients
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Media {
    pub const WHITELIST: &'static [&'static str] = &[
        "id",
        "owner_id",
        "filename",
        "mimetype",
        "size",
        "url",
        "created_at",
        "updated_at",
    ];
}

impl Whitelistable for Media {
    fn whitelist(&self) -> &'static [&'static str] {
        Self::WHITELIST
    }
}

impl From<&Media> for Node {
    fn from(media: &Media) -> Self {
        Entity::new(media.whitelist())
            .field("id", media.id)
            .field("owner_id", media.owner_id)
            .field("filename", media.filename.as_str())
            .field("mimetype", media.mimetype.as_str())
            .field("size", media.size)
            .field("url", media.url.as_str())
            .field("storage_path", media.storage_path.as_str())
            .field("created_at", Node::scalar(media.created_at))
            .field("updated_at", Node::scalar(media.updated_at))
            .into()
    }
}

impl From<Media> for Node {
    fn from(media: Media) -> Self {
        Node::from(&media)
    }
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub owner_id: i64,
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub url: String,
    pub storage_path: String,
}

#[derive(Debug, Clone, Default)]
pub struct MediaChanges {
    pub filename: Option<String>,
    pub mimetype: Option<String>,
    pub size: Option<i64>,
    pub url: Option<String>,
}

impl MediaChanges {
    pub fn apply(self, media: &mut Media) {
        if let Some(filename) = self.filename {
            media.filename = filename;
        }
        if let Some(mimetype) = self.mimetype {
            media.mimetype = mimetype;
        }
        if let Some(size) = self.size {
            media.size = size;
        }
        if let Some(url) = self.url {
            media.url = url;
        }
    }
}
