//! TV interface and mark endpoints.

use crate::error::AppError;
use crate::handlers::{parse_bool, parse_i64, ListParams};
use crate::models::tv_interface::{
    CreateMark, CreateTvInterface, UpdateMark, UpdateTvInterface,
};
use crate::response::{self, Pagination};
use crate::service::tv_interfaces::TvInterfaceService;
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
    if let Some(kind) = params.get("type").map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        opts.filters.push(("kind", SqlParam::Text(kind)));
    }
    let (rows, total) = TvInterfaceService::list(&state.pool, &opts).await?;
    Ok(response::paged(rows, Pagination::new(page, limit, total)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = TvInterfaceService::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("TV interface not found".into()))?;
    Ok(response::ok(row))
}

pub async fn by_device(
    State(state): State<AppState>,
    Path(device_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rows = TvInterfaceService::by_device(&state.pool, device_id).await?;
    Ok(response::ok(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateTvInterface>,
) -> Result<impl IntoResponse, AppError> {
    let row = TvInterfaceService::create(&state.pool, &body).await?;
    Ok(response::created(row, "TV interface created"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTvInterface>,
) -> Result<impl IntoResponse, AppError> {
    let row = TvInterfaceService::update(&state.pool, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("TV interface not found".into()))?;
    Ok(response::ok_with_message(row, "TV interface updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let force = parse_bool(&params, "force").unwrap_or(false);
    let row = if force {
        TvInterfaceService::hard_delete(&state.pool, id).await?
    } else {
        TvInterfaceService::soft_delete(&state.pool, id).await?
    }
    .ok_or_else(|| AppError::NotFound("TV interface not found".into()))?;
    let message = if force { "TV interface permanently deleted" } else { "TV interface archived" };
    Ok(response::ok_with_message(row, message))
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = TvInterfaceService::toggle(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("TV interface not found".into()))?;
    Ok(response::ok_with_message(row, "TV interface status toggled"))
}

#[derive(Debug, Default, Deserialize)]
pub struct DuplicateTvInterface {
    pub device_id: Option<i64>,
}

pub async fn duplicate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<DuplicateTvInterface>,
) -> Result<impl IntoResponse, AppError> {
    let row = TvInterfaceService::duplicate(&state.pool, id, body.device_id).await?;
    Ok(response::created(row, "TV interface duplicated"))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = TvInterfaceService::stats(&state.pool).await?;
    Ok(response::ok(stats))
}

pub async fn list_marks(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rows = TvInterfaceService::list_marks(&state.pool, id).await?;
    Ok(response::ok(rows))
}

pub async fn create_mark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CreateMark>,
) -> Result<impl IntoResponse, AppError> {
    let row = TvInterfaceService::create_mark(&state.pool, id, &body).await?;
    Ok(response::created(row, "Mark created"))
}

pub async fn update_mark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateMark>,
) -> Result<impl IntoResponse, AppError> {
    let row = TvInterfaceService::update_mark(&state.pool, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Mark not found".into()))?;
    Ok(response::ok_with_message(row, "Mark updated"))
}

pub async fn delete_mark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = TvInterfaceService::delete_mark(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Mark not found".into()))?;
    Ok(response::ok_with_message(row, "Mark deleted"))
}

#[derive(Debug, Deserialize)]
pub struct ReorderMarks {
    pub mark_ids: Vec<i64>,
}

pub async fn reorder_marks(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ReorderMarks>,
) -> Result<impl IntoResponse, AppError> {
    let rows = TvInterfaceService::reorder_marks(&state.pool, id, &body.mark_ids).await?;
    Ok(response::ok_with_message(rows, "Mark order updated"))
}
