//! Append-only audit trail for catalog mutations.

use crate::error::AppError;

/// Record one mutation. Runs on a pool or an open transaction.
pub async fn record<'e, E>(
    executor: E,
    entity_type: &str,
    entity_id: i64,
    action: &str,
    old_value: Option<serde_json::Value>,
    new_value: Option<serde_json::Value>,
) -> Result<(), AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO change_logs (entity_type, entity_id, action, old_value, new_value)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(entity_type)
    .bind(entity_id)
    .bind(action)
    .bind(old_value)
    .bind(new_value)
    .execute(executor)
    .await?;
    Ok(())
}

pub fn snapshot<T: serde::Serialize>(v: &T) -> Option<serde_json::Value> {
    serde_json::to_value(v).ok()
}
