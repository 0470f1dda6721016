#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use media_api::config::{AppConfig, Environment};
use media_api::database::{MemoryMediaRepository, MemoryUserRepository};
use media_api::{app, AppState};

pub const ADMIN: &str = "root";
pub const ADMIN_PASSWORD: &str = "root-password";
pub const PASSWORD: &str = "user-password";

/// An in-process server on its own port with in-memory repositories
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub api_url: String,
    pub state: AppState,
    /// Direct repository access, bypassing services and cache invalidation
    pub users: Arc<MemoryUserRepository>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let mut config = AppConfig::preset(Environment::Development);
        config.cache.is_active = true;
        config.cache.ttl_secs = 60;
        configure(&mut config);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        config.api.port = port;
        let base_url = format!("http://127.0.0.1:{}", port);
        let api_url = format!("{}{}", base_url, config.api.base_path);

        let users = Arc::new(MemoryUserRepository::new());
        let state = AppState::new(config, users.clone(), Arc::new(MemoryMediaRepository::new()))?;
        state
            .users
            .ensure_admin(ADMIN, "root@example.com", ADMIN_PASSWORD)
            .await?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        let router = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            port,
            base_url,
            api_url,
            state,
            users,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Register a regular user, returning `(access_token, user_id)`
    pub async fn register(&self, username: &str) -> Result<(String, i64)> {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
        let body: Value = res.json().await?;
        Ok((access_token(&body)?, body["user"]["id"].as_i64().context("missing user id")?))
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "login": login, "password": password }))
            .send()
            .await?)
    }

    pub async fn admin_token(&self) -> Result<String> {
        let body: Value = self.login(ADMIN, ADMIN_PASSWORD).await?.json().await?;
        access_token(&body)
    }
}

pub fn access_token(body: &Value) -> Result<String> {
    body["token"]["access_token"]
        .as_str()
        .map(str::to_string)
        .context("missing access token")
}

/// Fail if any object in `value` carries one of the hidden fields
pub fn assert_no_secrets(value: &Value) {
    match value {
        Value::Object(map) => {
            for hidden in ["password", "api_key", "storage_path"] {
                assert!(!map.contains_key(hidden), "`{}` leaked in {}", hidden, value);
            }
            map.values().for_each(assert_no_secrets);
        }
        Value::Array(items) => items.iter().for_each(assert_no_secrets),
        _ => {}
    }
}
