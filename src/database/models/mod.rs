pub mod media;
pub mod user;

pub use media::{Media, MediaChanges, NewMedia};
pub use user::{NewUser, Role, User, UserChanges, UserFilter};
