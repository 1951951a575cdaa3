//! Category lookups, including the get-or-create used when posts are written.

use super::{include_selects, row_id};
use crate::config::BlogModel;
use crate::error::AppError;
use crate::gateway::{Gateway, Row};
use serde_json::Value;

/// How a request names a category: by id (must exist) or by name (created on demand).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryRef {
    Id(i64),
    Name(String),
}

impl CategoryRef {
    /// Accepts a positive integer or a non-empty string; anything else is a validation error on `field`.
    pub fn from_value(field: &str, v: &Value) -> Result<Self, AppError> {
        match v {
            Value::Number(n) => match n.as_i64() {
                Some(id) if id > 0 => Ok(CategoryRef::Id(id)),
                _ => Err(AppError::invalid(field, format!("{} must be a positive integer id", field))),
            },
            Value::String(s) if !s.trim().is_empty() => Ok(CategoryRef::Name(s.trim().to_string())),
            _ => Err(AppError::invalid(field, format!("{} must be a category id or name", field))),
        }
    }
}

pub struct CategoryService;

impl CategoryService {
    pub async fn list(gw: &dyn Gateway, model: &BlogModel) -> Result<Vec<Value>, AppError> {
        gw.list(&model.categories, &[], &[]).await
    }

    /// One category with its posts.
    pub async fn read(gw: &dyn Gateway, model: &BlogModel, id: i64) -> Result<Option<Value>, AppError> {
        let includes = include_selects(model, &model.categories);
        gw.read(&model.categories, id, &includes).await
    }

    /// Find the category by name, else insert it. Returns the row and whether it was inserted.
    /// A concurrent insert of the same name loses on the unique constraint and re-reads the winner.
    pub async fn get_or_create(gw: &dyn Gateway, model: &BlogModel, name: &str) -> Result<(Value, bool), AppError> {
        let name = name.trim();
        let filters = [("name".to_string(), Value::from(name))];
        if let Some(row) = gw.find_one(&model.categories, &filters).await? {
            return Ok((row, false));
        }
        let mut body = Row::new();
        body.insert("name".into(), Value::from(name));
        match gw.create(&model.categories, &body).await {
            Ok(row) => {
                tracing::info!(category_id = ?row.get("id"), name = %name, "category created");
                Ok((row, true))
            }
            Err(AppError::Conflict(_)) => {
                tracing::debug!(name = %name, "category inserted concurrently, re-reading");
                gw.find_one(&model.categories, &filters)
                    .await?
                    .map(|row| (row, false))
                    .ok_or_else(|| AppError::Conflict(format!("category '{}' could not be created", name)))
            }
            Err(e) => Err(e),
        }
    }

    /// Turn a category reference into an existing category id.
    pub async fn resolve(gw: &dyn Gateway, model: &BlogModel, category: &CategoryRef) -> Result<i64, AppError> {
        match category {
            CategoryRef::Id(id) => match gw.read(&model.categories, *id, &[]).await? {
                Some(_) => Ok(*id),
                None => Err(AppError::invalid("category", format!("category {} does not exist", id))),
            },
            CategoryRef::Name(name) => {
                let (row, _) = Self::get_or_create(gw, model, name).await?;
                row_id(&row)
            }
        }
    }

    pub async fn delete(gw: &dyn Gateway, model: &BlogModel, id: i64) -> Result<Option<Value>, AppError> {
        let deleted = gw.delete(&model.categories, id).await?;
        if deleted.is_some() {
            tracing::info!(category_id = id, "category deleted");
        }
        Ok(deleted)
    }
}
