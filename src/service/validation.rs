//! Request validation from per-field rules. Every failing field is reported, in rule order.

use crate::config::{ValidationRule, ValueKind};
use crate::error::{AppError, FieldError};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a full body: required fields must be present and non-null.
    pub fn validate(body: &HashMap<String, Value>, rules: &[(String, ValidationRule)]) -> Result<(), AppError> {
        let mut errors = Vec::new();
        for (field, rule) in rules {
            match body.get(field) {
                None | Some(Value::Null) if rule.required => {
                    errors.push(FieldError::new(field.as_str(), format!("{} is required", field)));
                }
                Some(v) => validate_field(field, v, rule, &mut errors),
                None => {}
            }
        }
        finish(errors)
    }

    /// Validate only the fields present in body (partial edits). Required fields may be absent
    /// but not explicitly null.
    pub fn validate_partial(body: &HashMap<String, Value>, rules: &[(String, ValidationRule)]) -> Result<(), AppError> {
        let mut errors = Vec::new();
        for (field, rule) in rules {
            match body.get(field) {
                Some(Value::Null) if rule.required => {
                    errors.push(FieldError::new(field.as_str(), format!("{} cannot be null", field)));
                }
                Some(v) => validate_field(field, v, rule, &mut errors),
                None => {}
            }
        }
        finish(errors)
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn kind_matches(v: &Value, kind: ValueKind) -> bool {
    match kind {
        ValueKind::String => v.is_string(),
        ValueKind::PositiveInteger => v.as_i64().is_some_and(|n| n > 0),
    }
}

fn validate_field(field: &str, v: &Value, rule: &ValidationRule, errors: &mut Vec<FieldError>) {
    if v.is_null() {
        return;
    }
    if !rule.accepts.is_empty() && !rule.accepts.iter().any(|k| kind_matches(v, *k)) {
        let kinds: Vec<&str> = rule.accepts.iter().map(|k| k.describe()).collect();
        errors.push(FieldError::new(field, format!("{} must be {}", field, kinds.join(" or "))));
        return;
    }
    let Some(s) = v.as_str() else { return };
    let trimmed = s.trim();
    let len = trimmed.chars().count();
    if let Some(min) = rule.min_length {
        if len < min as usize {
            let message = if min == 1 {
                format!("{} must not be empty", field)
            } else {
                format!("{} must be at least {} characters", field, min)
            };
            errors.push(FieldError::new(field, message));
            return;
        }
    }
    if let Some(max) = rule.max_length {
        if len > max as usize {
            errors.push(FieldError::new(field, format!("{} must be at most {} characters", field, max)));
            return;
        }
    }
    if let Some(pattern) = &rule.pattern {
        if trimmed.is_empty() {
            return;
        }
        match Regex::new(pattern) {
            Ok(re) if re.is_match(trimmed) => {}
            Ok(_) => {
                let what = rule.pattern_name.as_deref().unwrap_or("in the expected format");
                errors.push(FieldError::new(field, format!("{} must be {}", field, what)));
            }
            Err(_) => errors.push(FieldError::new(field, format!("invalid pattern for {}", field))),
        }
    }
}
