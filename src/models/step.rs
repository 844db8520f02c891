use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// `step_number` is assigned by the service (max + 1 on create, rewritten on
/// reorder) and is never taken from a request body.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DiagnosticStep {
    pub id: i64,
    pub problem_id: i64,
    pub device_id: Option<i64>,
    pub step_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub estimated_time: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStep {
    pub problem_id: i64,
    pub device_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub estimated_time: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStep {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub estimated_time: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderSteps {
    pub problem_id: i64,
    pub step_ids: Vec<i64>,
}
