use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Read-only in the API: the remotes endpoints serve rows but expose no
/// write surface.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Remote {
    pub id: i64,
    pub device_id: Option<i64>,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub image_url: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
