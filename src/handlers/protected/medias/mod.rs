// handlers/protected/medias/mod.rs - /medias and /medias/:id

use serde::Deserialize;

pub mod collection;
pub mod record;

pub use collection::get as collection_get;
pub use collection::post as collection_post;
pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::patch as record_patch;
pub use record::put as record_put;

/// Body of PUT /medias/:id
#[derive(Debug, Deserialize)]
pub struct ReplaceMediaRequest {
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub url: Option<String>,
}

/// Body of PATCH /medias/:id
#[derive(Debug, Default, Deserialize)]
pub struct PatchMediaRequest {
    pub filename: Option<String>,
    pub mimetype: Option<String>,
    pub size: Option<i64>,
    pub url: Option<String>,
}

impl From<ReplaceMediaRequest> for PatchMediaRequest {
    fn from(body: ReplaceMediaRequest) -> Self {
        Self {
            filename: Some(body.filename),
            mimetype: Some(body.mimetype),
            size: Some(body.size),
            url: body.url,
        }
    }
}
