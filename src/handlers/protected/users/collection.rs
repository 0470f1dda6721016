// handlers/protected/users/collection.rs - GET, POST /users (administrators)

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::{Role, UserFilter};
use crate::handlers::validation;
use crate::middleware::{ApiResult, ResponseContext};
use crate::sanitize::Node;
use crate::services::Registration;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub role: Option<Role>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /users - paginated, optionally filtered by role
pub async fn get(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult {
    let page = crate::handlers::PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .page(&state);
    let filter = UserFilter { role: query.role };

    let (users, total) = state.users.list(&filter, page).await?;
    Ok(ResponseContext::paginated(Node::list(users), page, total))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// POST /users - create an account with any role
pub async fn post(State(state): State<AppState>, Json(body): Json<CreateUserRequest>) -> ApiResult {
    validation::username(&body.username)?;
    validation::email(&body.email)?;
    validation::password(&body.password)?;

    let user = state
        .users
        .register(Registration {
            username: body.username,
            email: body.email,
            password: body.password,
            role: body.role.unwrap_or(Role::User),
        })
        .await?;
    Ok(ResponseContext::success(user))
}
