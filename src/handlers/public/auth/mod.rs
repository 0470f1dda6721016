// handlers/public/auth/mod.rs - Token acquisition
//
// POST /auth/register, /auth/login and /auth/refresh. Responses carry the
// user as an entity node, so the sanitize layer strips hidden fields from
// `{ token, user }` like from any other payload.

use crate::auth::TokenPair;
use crate::database::User;
use crate::sanitize::Node;

pub mod login;
pub mod refresh;
pub mod register;

pub use login::login_post;
pub use refresh::refresh_post;
pub use register::register_post;

fn session(token: &TokenPair, user: &User) -> Node {
    Node::object([("token", Node::scalar(token)), ("user", Node::from(user))])
}
