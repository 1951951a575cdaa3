//! Standard response envelope helpers.

use crate::case::keys_to_camel_case;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

/// Outcome of a write: `{"created": true, "data": ...}` and friends.
#[derive(Serialize)]
pub struct WriteOutcome {
    #[serde(flatten)]
    pub flag: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl WriteOutcome {
    pub fn new(flag: &str, value: bool, data: Option<Value>) -> Self {
        let mut map = Map::new();
        map.insert(flag.to_string(), Value::Bool(value));
        WriteOutcome {
            flag: map,
            data: data.map(keys_to_camel_case),
        }
    }
}

pub fn success<T: Serialize>(status: StatusCode, message: impl Into<String>, data: T) -> (StatusCode, Json<Envelope<T>>) {
    (
        status,
        Json(Envelope {
            status: "success",
            message: message.into(),
            data,
        }),
    )
}

/// 200 with one row; keys are converted to camelCase.
pub fn success_one(message: impl Into<String>, row: Value) -> (StatusCode, Json<Envelope<Value>>) {
    success(StatusCode::OK, message, keys_to_camel_case(row))
}

/// 200 with many rows; keys are converted to camelCase.
pub fn success_many(message: impl Into<String>, rows: Vec<Value>) -> (StatusCode, Json<Envelope<Vec<Value>>>) {
    success(StatusCode::OK, message, rows.into_iter().map(keys_to_camel_case).collect())
}
