use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub order_index: i32,
    pub status: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDevice {
    pub name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub order_index: Option<i32>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDevice {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub order_index: Option<i32>,
    pub status: Option<String>,
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceStats {
    pub total: i64,
    pub active: i64,
    pub archived: i64,
    pub with_problems: i64,
}
