//! Typed configuration from environment variables.
//!
//! Fail-fast: `Config::from_env` returns an error when required variables are
//! missing or unparseable, and `main` exits 1. There is no degraded mode.

use crate::error::ConfigError;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::collections::HashMap;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 256;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database: DbConfig,
    /// Allowed CORS origins; empty means permissive.
    pub cors_origins: Vec<String>,
    /// Upper bound on concurrently served requests.
    pub max_in_flight: usize,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone)]
pub enum DbConfig {
    Url(String),
    Params {
        host: String,
        port: u16,
        name: String,
        user: String,
        password: String,
        ssl: bool,
    },
}

impl DbConfig {
    /// Database name, for CREATE DATABASE and stats queries.
    pub fn database_name(&self) -> String {
        match self {
            DbConfig::Url(url) => {
                let path = url.rsplit('/').next().unwrap_or("");
                path.split('?').next().unwrap_or("").to_string()
            }
            DbConfig::Params { name, .. } => name.clone(),
        }
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match self {
            DbConfig::Url(url) => PgConnectOptions::from_str(url).map_err(|_| ConfigError::InvalidVar {
                var: "DATABASE_URL",
                value: url.clone(),
            }),
            DbConfig::Params {
                host,
                port,
                name,
                user,
                password,
                ssl,
            } => {
                let mode = if *ssl { PgSslMode::Require } else { PgSslMode::Prefer };
                Ok(PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .database(name)
                    .username(user)
                    .password(password)
                    .ssl_mode(mode))
            }
        }
    }

    /// Options for the admin connection used to create the database.
    pub fn admin_connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        Ok(self.connect_options()?.database("postgres"))
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or("PORT", vars, DEFAULT_PORT)?;

        let database = if let Some(url) = non_empty(vars.get("DATABASE_URL")) {
            DbConfig::Url(url)
        } else {
            // Discrete variables: password is the one with no safe default.
            let password = non_empty(vars.get("DB_PASSWORD"))
                .ok_or(ConfigError::MissingVar("DB_PASSWORD (or DATABASE_URL)"))?;
            DbConfig::Params {
                host: non_empty(vars.get("DB_HOST")).unwrap_or_else(|| "localhost".into()),
                port: parse_or("DB_PORT", vars, 5432)?,
                name: non_empty(vars.get("DB_NAME")).unwrap_or_else(|| "ant_support".into()),
                user: non_empty(vars.get("DB_USER")).unwrap_or_else(|| "postgres".into()),
                password,
                ssl: vars.get("DB_SSL").map(|v| v == "true").unwrap_or(false),
            }
        };

        let cors_origins = vars
            .get("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            port,
            database,
            cors_origins,
            max_in_flight: parse_or("RATE_LIMIT_MAX", vars, DEFAULT_MAX_IN_FLIGHT)?,
            body_limit_bytes: parse_or("BODY_LIMIT_BYTES", vars, DEFAULT_BODY_LIMIT_BYTES)?,
        })
    }
}

fn non_empty(v: Option<&String>) -> Option<String> {
    v.map(|s| s.trim()).filter(|s| !s.is_empty()).map(String::from)
}

fn parse_or<T: FromStr>(var: &'static str, vars: &HashMap<String, String>, default: T) -> Result<T, ConfigError> {
    match non_empty(vars.get(var)) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn database_url_wins_over_discrete_vars() {
        let cfg = Config::from_vars(&vars(&[
            ("DATABASE_URL", "postgres://u:p@db.example/ant"),
            ("DB_PASSWORD", "ignored"),
        ]))
        .unwrap();
        assert!(matches!(cfg.database, DbConfig::Url(_)));
        assert_eq!(cfg.database.database_name(), "ant");
    }

    #[test]
    fn missing_password_without_url_is_rejected() {
        let err = Config::from_vars(&vars(&[("DB_HOST", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn discrete_vars_with_defaults() {
        let cfg = Config::from_vars(&vars(&[("DB_PASSWORD", "secret")])).unwrap();
        match &cfg.database {
            DbConfig::Params { host, port, name, user, ssl, .. } => {
                assert_eq!(host, "localhost");
                assert_eq!(*port, 5432);
                assert_eq!(name, "ant_support");
                assert_eq!(user, "postgres");
                assert!(!ssl);
            }
            _ => panic!("expected params"),
        }
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_vars(&vars(&[
            ("DB_PASSWORD", "secret"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { var: "PORT", .. }));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let cfg = Config::from_vars(&vars(&[
            ("DB_PASSWORD", "secret"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
        ]))
        .unwrap();
        assert_eq!(cfg.cors_origins, vec!["https://a.example", "https://b.example"]);
    }
}
