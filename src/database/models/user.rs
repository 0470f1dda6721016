use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::media::Media;
use crate::sanitize::{Entity, Node, Whitelistable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string
    pub password: String,
    pub role: Role,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub medias: Vec<Media>,
}

impl User {
    pub const WHITELIST: &'static [&'static str] = &[
        "id",
        "username",
        "email",
        "role",
        "media",
        "created_at",
        "updated_at",
    ];

    pub fn with_medias(mut self, medias: Vec<Media>) -> Self {
        self.medias = medias;
        self
    }
}

impl Whitelistable for User {
    fn whitelist(&self) -> &'static [&'static str] {
        Self::WHITELIST
    }
}

impl From<&User> for Node {
    fn from(user: &User) -> Self {
        Entity::new(user.whitelist())
            .field("id", user.id)
            .field("username", user.username.as_str())
            .field("email", user.email.as_str())
            .field("password", user.password.as_str())
            .field("role", user.role.as_str())
            .field("api_key", user.api_key.as_str())
            .field("created_at", Node::scalar(user.created_at))
            .field("updated_at", Node::scalar(user.updated_at))
            .field("medias", Node::list(user.medias.iter()))
            .into()
    }
}

impl From<User> for Node {
    fn from(user: User) -> Self {
        Node::from(&user)
    }
}

/// Insert payload; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub api_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password) = self.password {
            user.password = password;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::sanitize;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 1,
            username: "ada".into(),
            email: "ada@example.com".into(),
            password: "$argon2id$hash".into(),
            role: Role::Admin,
            api_key: "k".into(),
            created_at: now,
            updated_at: now,
            medias: vec![],
        }
    }

    #[test]
    fn sanitized_user_hides_credentials() {
        let out = sanitize(Node::from(&user())).to_json();
        assert!(out.get("password").is_none());
        assert!(out.get("api_key").is_none());
        assert_eq!(out["role"], "admin");
        assert_eq!(out["medias"], serde_json::json!([]));
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert!("root".parse::<Role>().is_err());
    }
}
