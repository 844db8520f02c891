//! Diagnostic step endpoints.

use crate::error::AppError;
use crate::handlers::{parse_bool, parse_i64, ListParams};
use crate::models::step::{CreateStep, ReorderSteps, UpdateStep};
use crate::models::BulkUpdate;
use crate::response::{self, Pagination};
use crate::service::steps::StepService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let (mut opts, page, limit) = ListParams::from_query(&params).resolve();
    if let Some(problem_id) = parse_i64(&params, "problem_id") {
        opts.filters.push(StepService::problem_filter(problem_id));
    }
    if let Some(device_id) = parse_i64(&params, "device_id") {
        opts.filters.push(("device_id", crate::sql::SqlParam::Int(device_id)));
    }
    let (rows, total) = StepService::list(&state.pool, &opts).await?;
    Ok(response::paged(rows, Pagination::new(page, limit, total)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = StepService::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Step not found".into()))?;
    Ok(response::ok(row))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateStep>,
) -> Result<impl IntoResponse, AppError> {
    let row = StepService::create(&state.pool, &body).await?;
    Ok(response::created(row, "Step created"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStep>,
) -> Result<impl IntoResponse, AppError> {
    let row = StepService::update(&state.pool, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Step not found".into()))?;
    Ok(response::ok_with_message(row, "Step updated"))
}

/// DELETE /steps/:id. `force=true` removes the row; `reorder=false` skips
/// renumbering the remaining steps (default on).
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let force = parse_bool(&params, "force").unwrap_or(false);
    let renumber = parse_bool(&params, "reorder").unwrap_or(true);
    let row = StepService::delete(&state.pool, id, force, renumber)
        .await?
        .ok_or_else(|| AppError::NotFound("Step not found".into()))?;
    let message = if force { "Step permanently deleted" } else { "Step archived" };
    Ok(response::ok_with_message(row, message))
}

pub async fn reorder(
    State(state): State<AppState>,
    Json(body): Json<ReorderSteps>,
) -> Result<impl IntoResponse, AppError> {
    let rows = StepService::reorder(&state.pool, body.problem_id, &body.step_ids).await?;
    Ok(response::ok_with_message(rows, "Step order updated"))
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateSteps {
    pub updates: Vec<BulkUpdate<UpdateStep>>,
}

pub async fn bulk_update(
    State(state): State<AppState>,
    Json(body): Json<BulkUpdateSteps>,
) -> Result<impl IntoResponse, AppError> {
    let rows = StepService::bulk_update(&state.pool, &body.updates).await?;
    let message = format!("Updated {} steps", rows.len());
    Ok(response::ok_with_message(rows, message))
}
