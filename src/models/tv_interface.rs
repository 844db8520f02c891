use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TvInterface {
    pub id: i64,
    pub device_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub screenshot_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTvInterface {
    pub device_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub screenshot_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTvInterface {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub screenshot_url: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TvInterfaceMark {
    pub id: i64,
    pub tv_interface_id: i64,
    pub name: String,
    pub shape: String,
    pub position_x: i32,
    pub position_y: i32,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub color: Option<String>,
    pub order_index: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMark {
    pub name: String,
    pub shape: Option<String>,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub color: Option<String>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMark {
    pub name: Option<String>,
    pub shape: Option<String>,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub color: Option<String>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TvInterfaceStats {
    pub total: i64,
    pub active: i64,
    pub devices_covered: i64,
}
