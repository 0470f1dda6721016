use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    /// Mount point of the REST routes, e.g. `/api/v1`. Empty mounts at root.
    pub base_path: String,
    /// Responses are JSON; gates sanitization and caching.
    pub json_content: bool,
    pub default_per_page: u32,
    pub max_per_page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub is_active: bool,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. Without one the in-memory store is used.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub access_expiry_minutes: i64,
    pub refresh_expiry_days: i64,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        Self::preset(environment).with_env_overrides()
    }

    pub fn preset(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Some(port) = env::var("API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_BASE_PATH") {
            self.api.base_path = normalize_base_path(&v);
        }
        if let Ok(v) = env::var("API_JSON_CONTENT") {
            self.api.json_content = v.parse().unwrap_or(self.api.json_content);
        }
        if let Ok(v) = env::var("API_DEFAULT_PER_PAGE") {
            self.api.default_per_page = v.parse().unwrap_or(self.api.default_per_page);
        }
        if let Ok(v) = env::var("API_MAX_PER_PAGE") {
            self.api.max_per_page = v.parse().unwrap_or(self.api.max_per_page);
        }

        // Cache overrides
        if let Ok(v) = env::var("CACHE_IS_ACTIVE") {
            self.cache.is_active = v.parse().unwrap_or(self.cache.is_active);
        }
        if let Ok(v) = env::var("CACHE_TTL_SECS") {
            self.cache.ttl_secs = v.parse().unwrap_or(self.cache.ttl_secs);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_ACCESS_EXPIRY_MINUTES") {
            self.security.access_expiry_minutes =
                v.parse().unwrap_or(self.security.access_expiry_minutes);
        }
        if let Ok(v) = env::var("SECURITY_REFRESH_EXPIRY_DAYS") {
            self.security.refresh_expiry_days =
                v.parse().unwrap_or(self.security.refresh_expiry_days);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                port: 8101,
                base_path: "/api/v1".to_string(),
                json_content: true,
                default_per_page: 25,
                max_per_page: 100,
            },
            cache: CacheConfig {
                is_active: false,
                ttl_secs: 60,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                access_expiry_minutes: 60 * 24,
                refresh_expiry_days: 30,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                port: 8101,
                base_path: "/api/v1".to_string(),
                json_content: true,
                default_per_page: 25,
                max_per_page: 100,
            },
            cache: CacheConfig {
                is_active: true,
                ttl_secs: 30,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                access_expiry_minutes: 60,
                refresh_expiry_days: 7,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                port: 8101,
                base_path: "/api/v1".to_string(),
                json_content: true,
                default_per_page: 25,
                max_per_page: 50,
            },
            cache: CacheConfig {
                is_active: true,
                ttl_secs: 300,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                access_expiry_minutes: 15,
                refresh_expiry_days: 7,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

/// `api/v1/` -> `/api/v1`, `/` -> ``
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::preset(Environment::Development);
        assert!(!config.cache.is_active);
        assert_eq!(config.api.base_path, "/api/v1");
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::preset(Environment::Production);
        assert!(config.cache.is_active);
        assert_eq!(config.cache.ttl_secs, 300);
        assert!(config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("api/v1/"), "/api/v1");
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("/v2"), "/v2");
    }
}
