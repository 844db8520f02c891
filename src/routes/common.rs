//! Health routes: process liveness and database readiness.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct DbHealthBody {
    status: &'static str,
    database: &'static str,
    timestamp: String,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        timestamp: now(),
    })
}

async fn health_db(
    State(state): State<AppState>,
) -> Result<Json<DbHealthBody>, (StatusCode, Json<DbHealthBody>)> {
    if sqlx::query("SELECT 1").fetch_optional(&state.pool).await.is_err() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(DbHealthBody {
                status: "degraded",
                database: "unavailable",
                timestamp: now(),
            }),
        ));
    }
    Ok(Json(DbHealthBody {
        status: "ok",
        database: "ok",
        timestamp: now(),
    }))
}

/// GET /health and GET /health/db.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(health_db))
        .with_state(state)
}
