//! Pool construction and database-level helpers.

use crate::config::DbConfig;
use crate::error::AppError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{ConnectOptions, PgPool};
use std::time::Duration;

/// Pool bounds match the original deployment profile: bounded pool,
/// connections acquired per statement and released automatically.
pub async fn connect(config: &DbConfig) -> Result<PgPool, AppError> {
    let opts = config
        .connect_options()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(30))
        .connect_with(opts)
        .await?;
    Ok(pool)
}

/// Ensure the configured database exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before `connect`.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<(), AppError> {
    let db_name = config.database_name();
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = config
        .admin_connect_options()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

#[derive(Debug, serde::Serialize)]
pub struct ServerInfo {
    pub server_time: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// Startup connectivity check. Failure here aborts the process.
pub async fn test_connection(pool: &PgPool) -> Result<ServerInfo, AppError> {
    let (server_time, version): (chrono::DateTime<chrono::Utc>, String) =
        sqlx::query_as("SELECT NOW(), version()").fetch_one(pool).await?;
    Ok(ServerInfo { server_time, version })
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\\\"ird\"");
    }
}
