// handlers/protected/users/mod.rs - /users and /users/:id

use serde::Deserialize;

use crate::database::Role;

pub mod collection;
pub mod record;

pub use collection::get as collection_get;
pub use collection::post as collection_post;
pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::medias as record_medias;
pub use record::patch as record_patch;
pub use record::put as record_put;

/// Body of PUT /users/:id; replaces the editable fields
#[derive(Debug, Deserialize)]
pub struct ReplaceUserRequest {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Body of PATCH /users/:id; merges the provided fields
#[derive(Debug, Default, Deserialize)]
pub struct PatchUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl From<ReplaceUserRequest> for PatchUserRequest {
    fn from(body: ReplaceUserRequest) -> Self {
        Self {
            username: Some(body.username),
            email: Some(body.email),
            password: body.password,
            role: body.role,
        }
    }
}
