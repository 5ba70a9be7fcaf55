//! Entity handlers: list, show, create, update, delete, options.

use crate::error::AppError;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{ListParams, OptionsParams, ShowParams};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

pub async fn list(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    state.table_view().list(&model, &params).await
}

pub async fn show(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    Query(params): Query<ShowParams>,
) -> Result<impl IntoResponse, AppError> {
    state.table_view().show(&model, &id, &params).await
}

pub async fn create(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let row = state.crud().create(&model, body).await?;
    Ok(success_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let row = state.crud().update(&model, &id, body).await?;
    Ok(success_one_ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.crud().delete(&model, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn options(
    State(state): State<AppState>,
    Path((model, field)): Path<(String, String)>,
    Query(params): Query<OptionsParams>,
) -> Result<impl IntoResponse, AppError> {
    let items = state.crud().options(&model, &field, &params).await?;
    Ok(success_many(items))
}
