//! Device endpoints.

use crate::error::AppError;
use crate::handlers::{parse_bool, parse_string, parse_u32, ListParams};
use crate::models::device::{CreateDevice, UpdateDevice};
use crate::models::BulkUpdate;
use crate::response::{self, Pagination};
use crate::service::devices::DeviceService;
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
    if let Some(status) = parse_string(&params, "status") {
        opts.filters.push(("status", crate::sql::SqlParam::Text(status)));
    }
    let (rows, total) = DeviceService::list(&state.pool, &opts).await?;
    Ok(response::paged(rows, Pagination::new(page, limit, total)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = DeviceService::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Device not found".into()))?;
    Ok(response::ok(row))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateDevice>,
) -> Result<impl IntoResponse, AppError> {
    let row = DeviceService::create(&state.pool, &body).await?;
    Ok(response::created(row, "Device created"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateDevice>,
) -> Result<impl IntoResponse, AppError> {
    let row = DeviceService::update(&state.pool, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Device not found".into()))?;
    Ok(response::ok_with_message(row, "Device updated"))
}

/// DELETE /devices/:id. Soft delete by default; `force=true` removes the
/// row outright and skips the dependency check.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let force = parse_bool(&params, "force").unwrap_or(false);
    if force {
        let row = DeviceService::hard_delete(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Device not found".into()))?;
        return Ok(response::ok_with_message(row, "Device permanently deleted"));
    }
    let check = DeviceService::can_delete(&state.pool, id).await?;
    if !check.can_delete {
        return Err(AppError::Constraint {
            message: check.reason.unwrap_or_else(|| "Device cannot be deleted".into()),
            suggestion: check.suggestion,
        });
    }
    let row = DeviceService::soft_delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Device not found".into()))?;
    Ok(response::ok_with_message(row, "Device archived"))
}

pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = DeviceService::restore(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Device not found or already active".into()))?;
    Ok(response::ok_with_message(row, "Device restored"))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let term = parse_string(&params, "q").unwrap_or_default();
    let limit = parse_u32(&params, "limit").unwrap_or(20).clamp(1, 50);
    let offset = parse_u32(&params, "offset").unwrap_or(0);
    let rows = DeviceService::search(&state.pool, &term, limit, offset).await?;
    Ok(response::ok(rows))
}

pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let limit = parse_u32(&params, "limit").unwrap_or(10).clamp(1, 20);
    let rows = DeviceService::popular(&state.pool, limit).await?;
    Ok(response::ok(rows))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = DeviceService::stats(&state.pool).await?;
    Ok(response::ok(stats))
}

#[derive(Debug, Deserialize)]
pub struct ReorderDevices {
    pub device_ids: Vec<i64>,
}

pub async fn reorder(
    State(state): State<AppState>,
    Json(body): Json<ReorderDevices>,
) -> Result<impl IntoResponse, AppError> {
    let rows = DeviceService::reorder(&state.pool, &body.device_ids).await?;
    Ok(response::ok_with_message(rows, "Device order updated"))
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateDevices {
    pub updates: Vec<BulkUpdate<UpdateDevice>>,
}

pub async fn bulk_update(
    State(state): State<AppState>,
    Json(body): Json<BulkUpdateDevices>,
) -> Result<impl IntoResponse, AppError> {
    let rows = DeviceService::bulk_update(&state.pool, &body.updates).await?;
    let message = format!("Updated {} devices", rows.len());
    Ok(response::ok_with_message(rows, message))
}

pub async fn export(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    match params.get("format").map(String::as_str) {
        None | Some("json") => {}
        Some(other) => {
            return Err(AppError::Validation(format!(
                "Unsupported export format: {other} (supported: json)"
            )))
        }
    }
    let rows = DeviceService::export(&state.pool).await?;
    Ok(response::ok(rows))
}
