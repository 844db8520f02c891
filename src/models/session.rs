use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DiagnosticSession {
    pub id: i64,
    pub device_id: i64,
    pub problem_id: i64,
    pub session_key: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_steps: i32,
    pub completed_steps: i32,
    pub success: bool,
    pub duration: Option<i32>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSession {
    pub device_id: i64,
    pub problem_id: i64,
    pub total_steps: Option<i32>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSession {
    pub completed_steps: Option<i32>,
    pub total_steps: Option<i32>,
    pub success: Option<bool>,
}

/// Body of POST /sessions/:id/complete. Duration is derived from
/// `start_time`, not trusted from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteSession {
    pub completed_steps: Option<i32>,
    pub success: bool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionStats {
    pub total: i64,
    pub completed: i64,
    pub successful: i64,
    pub avg_duration: Option<f64>,
}
