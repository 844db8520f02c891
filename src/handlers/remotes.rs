//! Remote control endpoints (read-only).

use crate::error::AppError;
use crate::handlers::parse_i64;
use crate::response;
use crate::service::remotes::RemoteService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use std::collections::HashMap;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let rows = RemoteService::list(&state.pool, parse_i64(&params, "device_id")).await?;
    Ok(response::ok(rows))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = RemoteService::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Remote not found".into()))?;
    Ok(response::ok(row))
}
