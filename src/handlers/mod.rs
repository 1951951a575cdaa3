//! HTTP handlers for posts and categories.

pub mod categories;
pub mod posts;
pub use categories::*;
pub use posts::*;

use crate::error::AppError;
use serde_json::Value;
use std::collections::HashMap;

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    match id_str.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::BadRequest(format!("invalid id '{}'", id_str))),
    }
}

fn body_to_map(value: Value) -> Result<HashMap<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m.into_iter().collect()),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}
