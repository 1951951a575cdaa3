//! Category handlers.

use super::{body_to_map, parse_id};
use crate::case::hashmap_keys_to_snake_case;
use crate::error::AppError;
use crate::response::{success, success_many, success_one, WriteOutcome};
use crate::service::{CategoryService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

const NOT_FOUND: &str = "Category doesn't exist";

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = CategoryService::list(state.gateway.as_ref(), &state.model).await?;
    Ok(success_many("All categories", rows))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let row = CategoryService::read(state.gateway.as_ref(), &state.model, id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    Ok(success_one(format!("Category ID: {}", id), row))
}

/// Get-or-create by name: 201 when inserted, 200 when the name already existed.
pub async fn create_category(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let body = hashmap_keys_to_snake_case(body_to_map(body)?);
    RequestValidator::validate(&body, &state.model.categories.validation)?;
    let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
    let (row, created) = CategoryService::get_or_create(state.gateway.as_ref(), &state.model, name).await?;
    let (status, message) = if created {
        (StatusCode::CREATED, "Category created successfully")
    } else {
        (StatusCode::OK, "Category already exists")
    };
    Ok(success(status, message, WriteOutcome::new("created", created, Some(row))))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    match CategoryService::delete(state.gateway.as_ref(), &state.model, id).await? {
        Some(_) => Ok(success(
            StatusCode::OK,
            "Category deleted successfully",
            WriteOutcome::new("deleted", true, None),
        )),
        None => Err(AppError::NotFound {
            message: NOT_FOUND.into(),
            details: Some(json!({ "deleted": false })),
        }),
    }
}
