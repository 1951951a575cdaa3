//! Post handlers: list, read, create, edit, delete.

use super::{body_to_map, parse_id};
use crate::error::AppError;
use crate::response::{success, success_many, success_one, WriteOutcome};
use crate::service::PostService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

const NOT_FOUND: &str = "Post doesn't exist";

pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = PostService::list(state.gateway.as_ref(), &state.model).await?;
    Ok(success_many("All posts", rows))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let row = PostService::read(state.gateway.as_ref(), &state.model, id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    Ok(success_one(format!("Post ID: {}", id), row))
}

pub async fn create_post(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let body = body_to_map(body)?;
    let row = PostService::create(state.gateway.as_ref(), &state.model, body).await?;
    Ok(success(
        StatusCode::CREATED,
        "Post created successfully",
        WriteOutcome::new("created", true, Some(row)),
    ))
}

pub async fn edit_post(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(body) = body?;
    let body = body_to_map(body)?;
    match PostService::edit(state.gateway.as_ref(), &state.model, id, body).await? {
        Some(row) => Ok(success(
            StatusCode::OK,
            "Post edited successfully",
            WriteOutcome::new("edited", true, Some(row)),
        )),
        None => Err(AppError::NotFound {
            message: NOT_FOUND.into(),
            details: Some(json!({ "edited": false })),
        }),
    }
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    match PostService::delete(state.gateway.as_ref(), &state.model, id).await? {
        Some(_) => Ok(success(
            StatusCode::OK,
            "Post deleted successfully",
            WriteOutcome::new("deleted", true, None),
        )),
        None => Err(AppError::NotFound {
            message: NOT_FOUND.into(),
            details: Some(json!({ "deleted": false })),
        }),
    }
}
