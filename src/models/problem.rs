use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// `category`, `difficulty` and `status` are free-form TEXT columns
/// constrained by request validation, not database enums.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub device_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub tags: serde_json::Value,
    pub priority: i32,
    pub estimated_time: Option<i32>,
    pub difficulty: String,
    pub success_rate: Option<i32>,
    pub completed_count: i32,
    pub status: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProblem {
    pub device_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub tags: Option<serde_json::Value>,
    pub priority: Option<i32>,
    pub estimated_time: Option<i32>,
    pub difficulty: Option<String>,
    pub success_rate: Option<i32>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProblem {
    pub device_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub tags: Option<serde_json::Value>,
    pub priority: Option<i32>,
    pub estimated_time: Option<i32>,
    pub difficulty: Option<String>,
    pub success_rate: Option<i32>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProblemStats {
    pub total: i64,
    pub active: i64,
    pub published: i64,
    pub critical: i64,
}
