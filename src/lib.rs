//! Users and medias REST API with a sanitizing, caching response pipeline.

pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod resolver;
pub mod sanitize;
pub mod services;

pub use app::{app, AppState};
pub use config::AppConfig;
