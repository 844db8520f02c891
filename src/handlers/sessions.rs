//! Diagnostic session endpoints.

use crate::error::AppError;
use crate::handlers::{parse_i64, ListParams};
use crate::models::session::{CompleteSession, CreateSession, UpdateSession};
use crate::response::{self, Pagination};
use crate::service::sessions::SessionService;
use crate::sql::SqlParam;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let (mut opts, page, limit) = ListParams::from_query(&params).resolve();
    if let Some(device_id) = parse_i64(&params, "device_id") {
        opts.filters.push(("device_id", SqlParam::Int(device_id)));
    }
    if let Some(problem_id) = parse_i64(&params, "problem_id") {
        opts.filters.push(("problem_id", SqlParam::Int(problem_id)));
    }
    let (rows, total) = SessionService::list(&state.pool, &opts).await?;
    Ok(response::paged(rows, Pagination::new(page, limit, total)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = SessionService::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".into()))?;
    Ok(response::ok(row))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateSession>,
) -> Result<impl IntoResponse, AppError> {
    let row = SessionService::create(&state.pool, &body).await?;
    Ok(response::created(row, "Session started"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSession>,
) -> Result<impl IntoResponse, AppError> {
    let row = SessionService::update(&state.pool, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".into()))?;
    Ok(response::ok_with_message(row, "Session updated"))
}

pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CompleteSession>,
) -> Result<impl IntoResponse, AppError> {
    let row = SessionService::complete(&state.pool, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".into()))?;
    Ok(response::ok_with_message(row, "Session completed"))
}

pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let stats = SessionService::stats(
        &state.pool,
        parse_i64(&params, "device_id"),
        parse_i64(&params, "problem_id"),
    )
    .await?;
    Ok(response::ok(stats))
}
