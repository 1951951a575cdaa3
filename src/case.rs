//! Key case conversion: request keys camelCase -> snake_case (column names), response keys snake_case -> camelCase.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// "category_id" -> "categoryID", "created_at" -> "createdAt". A non-leading `id` word is written
/// as the acronym `ID`, the inverse of [`to_snake_case`] on "categoryID".
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split('_').filter(|w| !w.is_empty()) {
        if out.is_empty() {
            out.push_str(word);
        } else if word == "id" {
            out.push_str("ID");
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

/// "categoryId" -> "category_id". Runs of capitals count as one word, so "categoryID" -> "category_id".
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let word_start = match prev {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) => p.is_uppercase() && next.is_some_and(|n| n.is_lowercase()),
            };
            if word_start {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn object_keys_to_camel_case(obj: Map<String, Value>) -> Map<String, Value> {
    obj.into_iter()
        .map(|(k, v)| (to_camel_case(&k), keys_to_camel_case(v)))
        .collect()
}

/// Recursively camelCase every object key (objects and arrays of objects).
pub fn keys_to_camel_case(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(object_keys_to_camel_case(map)),
        Value::Array(arr) => Value::Array(arr.into_iter().map(keys_to_camel_case).collect()),
        other => other,
    }
}

/// Top-level keys only; nested values are left untouched.
pub fn hashmap_keys_to_snake_case(map: HashMap<String, Value>) -> HashMap<String, Value> {
    map.into_iter().map(|(k, v)| (to_snake_case(&k), v)).collect()
}
