//! Post controller: validation, category resolution and writes through the gateway.

use super::categories::{CategoryRef, CategoryService};
use super::{include_selects, row_id, RequestValidator};
use crate::case::hashmap_keys_to_snake_case;
use crate::config::BlogModel;
use crate::error::AppError;
use crate::gateway::{Gateway, Row};
use serde_json::Value;
use std::collections::HashMap;

/// Fields a post body may carry, after normalization.
const POST_FIELDS: [&str; 4] = ["title", "content", "image", "category"];

/// Snake-case the keys and fold aliases: `body` -> `content`, `category_id` -> `category`.
/// The canonical name wins when both are sent.
pub fn normalize_post_body(body: HashMap<String, Value>) -> HashMap<String, Value> {
    let mut body = hashmap_keys_to_snake_case(body);
    for (alias, canonical) in [("body", "content"), ("category_id", "category")] {
        if let Some(v) = body.remove(alias) {
            body.entry(canonical.to_string()).or_insert(v);
        }
    }
    body.retain(|k, _| POST_FIELDS.contains(&k.as_str()));
    body
}

/// Storage row from a validated body; `category` is replaced by the resolved `category_id`.
fn storage_row(body: &HashMap<String, Value>, category_id: Option<i64>) -> Row {
    let mut row = Row::new();
    if let Some(title) = body.get("title").and_then(Value::as_str) {
        row.insert("title".into(), Value::from(title.trim()));
    }
    if let Some(content) = body.get("content") {
        row.insert("content".into(), content.clone());
    }
    if let Some(image) = body.get("image") {
        let image = match image.as_str().map(str::trim) {
            Some("") | None => Value::Null,
            Some(s) => Value::from(s),
        };
        row.insert("image".into(), image);
    }
    if let Some(id) = category_id {
        row.insert("category_id".into(), Value::from(id));
    }
    row
}

pub struct PostService;

impl PostService {
    /// All posts with their category embedded.
    pub async fn list(gw: &dyn Gateway, model: &BlogModel) -> Result<Vec<Value>, AppError> {
        let includes = include_selects(model, &model.posts);
        gw.list(&model.posts, &[], &includes).await
    }

    pub async fn read(gw: &dyn Gateway, model: &BlogModel, id: i64) -> Result<Option<Value>, AppError> {
        let includes = include_selects(model, &model.posts);
        gw.read(&model.posts, id, &includes).await
    }

    /// Validate, resolve the category (get-or-create by name, or an existing id), insert.
    pub async fn create(gw: &dyn Gateway, model: &BlogModel, body: HashMap<String, Value>) -> Result<Value, AppError> {
        let body = normalize_post_body(body);
        RequestValidator::validate(&body, &model.posts.validation)?;
        let category = match body.get("category") {
            Some(v) => CategoryRef::from_value("category", v)?,
            None => return Err(AppError::invalid("category", "category is required")),
        };
        let category_id = CategoryService::resolve(gw, model, &category).await?;
        let row = gw.create(&model.posts, &storage_row(&body, Some(category_id))).await?;
        let id = row_id(&row)?;
        tracing::info!(post_id = id, category_id, "post created");
        Ok(Self::read(gw, model, id).await?.unwrap_or(row))
    }

    /// Partial edit. `None` when the post does not exist; the category is only resolved
    /// once the post is known to exist.
    pub async fn edit(
        gw: &dyn Gateway,
        model: &BlogModel,
        id: i64,
        body: HashMap<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let body = normalize_post_body(body);
        if body.is_empty() {
            return Err(AppError::invalid(
                "body",
                format!("at least one field must be provided: {}", POST_FIELDS.join(", ")),
            ));
        }
        RequestValidator::validate_partial(&body, &model.posts.validation)?;
        let category = body
            .get("category")
            .map(|v| CategoryRef::from_value("category", v))
            .transpose()?;

        if gw.read(&model.posts, id, &[]).await?.is_none() {
            return Ok(None);
        }
        let category_id = match &category {
            Some(c) => Some(CategoryService::resolve(gw, model, c).await?),
            None => None,
        };
        let Some(row) = gw.update(&model.posts, id, &storage_row(&body, category_id)).await? else {
            return Ok(None);
        };
        tracing::info!(post_id = id, ?category_id, "post edited");
        Ok(Some(Self::read(gw, model, id).await?.unwrap_or(row)))
    }

    pub async fn delete(gw: &dyn Gateway, model: &BlogModel, id: i64) -> Result<Option<Value>, AppError> {
        let deleted = gw.delete(&model.posts, id).await?;
        if deleted.is_some() {
            tracing::info!(post_id = id, "post deleted");
        }
        Ok(deleted)
    }
}
