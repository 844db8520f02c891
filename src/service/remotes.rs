//! Remote controls: read-only API over the remotes table.

use crate::error::AppError;
use crate::models::remote::Remote;
use sqlx::PgPool;

pub struct RemoteService;

impl RemoteService {
    pub async fn list(pool: &PgPool, device_id: Option<i64>) -> Result<Vec<Remote>, AppError> {
        let rows = match device_id {
            Some(device_id) => {
                sqlx::query_as::<_, Remote>(
                    "SELECT * FROM remotes WHERE is_active AND device_id = $1 ORDER BY name, id",
                )
                .bind(device_id)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Remote>("SELECT * FROM remotes WHERE is_active ORDER BY name, id")
                    .fetch_all(pool)
                    .await?
            }
        };
        Ok(rows)
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Remote>, AppError> {
        let row = sqlx::query_as::<_, Remote>("SELECT * FROM remotes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }
}
