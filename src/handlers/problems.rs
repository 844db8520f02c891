//! Problem endpoints.

use crate::error::AppError;
use crate::handlers::{parse_bool, parse_i64, parse_string, ListParams};
use crate::models::problem::{CreateProblem, UpdateProblem};
use crate::models::BulkUpdate;
use crate::response::{self, Pagination};
use crate::service::problems::ProblemService;
use crate::sql::SqlParam;
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
    if let Some(device_id) = parse_i64(&params, "device_id") {
        opts.filters.push(("device_id", SqlParam::Int(device_id)));
    }
    if let Some(category) = parse_string(&params, "category") {
        opts.filters.push(("category", SqlParam::Text(category)));
    }
    if let Some(status) = parse_string(&params, "status") {
        opts.filters.push(("status", SqlParam::Text(status)));
    }
    let (rows, total) = ProblemService::list(&state.pool, &opts).await?;
    Ok(response::paged(rows, Pagination::new(page, limit, total)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = ProblemService::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem not found".into()))?;
    Ok(response::ok(row))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateProblem>,
) -> Result<impl IntoResponse, AppError> {
    let row = ProblemService::create(&state.pool, &body).await?;
    Ok(response::created(row, "Problem created"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProblem>,
) -> Result<impl IntoResponse, AppError> {
    let row = ProblemService::update(&state.pool, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem not found".into()))?;
    Ok(response::ok_with_message(row, "Problem updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let force = parse_bool(&params, "force").unwrap_or(false);
    if force {
        let row = ProblemService::hard_delete(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Problem not found".into()))?;
        return Ok(response::ok_with_message(row, "Problem permanently deleted"));
    }
    let check = ProblemService::can_delete(&state.pool, id).await?;
    if !check.can_delete {
        return Err(AppError::Constraint {
            message: check.reason.unwrap_or_else(|| "Problem cannot be deleted".into()),
            suggestion: check.suggestion,
        });
    }
    let row = ProblemService::soft_delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem not found".into()))?;
    Ok(response::ok_with_message(row, "Problem archived"))
}

pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = ProblemService::restore(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem not found or already active".into()))?;
    Ok(response::ok_with_message(row, "Problem restored"))
}

#[derive(Debug, Deserialize)]
pub struct DuplicateProblem {
    pub device_id: i64,
}

pub async fn duplicate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<DuplicateProblem>,
) -> Result<impl IntoResponse, AppError> {
    let row = ProblemService::duplicate_to_device(&state.pool, id, body.device_id).await?;
    Ok(response::created(row, "Problem duplicated"))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = ProblemService::stats(&state.pool).await?;
    Ok(response::ok(stats))
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateProblems {
    pub updates: Vec<BulkUpdate<UpdateProblem>>,
}

pub async fn bulk_update(
    State(state): State<AppState>,
    Json(body): Json<BulkUpdateProblems>,
) -> Result<impl IntoResponse, AppError> {
    let rows = ProblemService::bulk_update(&state.pool, &body.updates).await?;
    let message = format!("Updated {} problems", rows.len());
    Ok(response::ok_with_message(rows, message))
}
