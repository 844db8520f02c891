//! ANT Support backend: device diagnostics catalog over PostgreSQL.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use client::{ApiClient, ApiClientConfig, ApiError};
pub use config::{Config, DbConfig};
pub use error::{AppError, ConfigError};
pub use migration::run_migrations;
pub use routes::{api_routes, health_routes};
pub use state::AppState;
