//! Operational endpoints: cleanup, seed, test-data, db-info.

use crate::error::AppError;
use crate::response;
use crate::service::admin::AdminService;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};

pub async fn cleanup(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let summary = AdminService::cleanup(&state.pool).await?;
    Ok(response::ok_with_message(summary, "All catalog data cleared"))
}

pub async fn seed(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let summary = AdminService::seed(&state.pool).await?;
    let message = if summary.skipped {
        "Seed skipped: active devices already exist"
    } else {
        "Seed data created"
    };
    Ok(response::ok_with_message(summary, message))
}

pub async fn test_data(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let summary = AdminService::populate_test_data(&state.pool).await?;
    Ok(response::ok_with_message(summary, "Test data created"))
}

pub async fn db_info(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let info = AdminService::db_info(&state.pool).await?;
    Ok(response::ok(info))
}
