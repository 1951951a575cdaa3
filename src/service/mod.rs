//! Resource controllers for posts and categories, and request validation.

mod categories;
mod posts;
mod validation;
pub use categories::{CategoryRef, CategoryService};
pub use posts::{normalize_post_body, PostService};
pub use validation::RequestValidator;

use crate::config::{BlogModel, ResolvedEntity};
use crate::error::AppError;
use crate::sql::IncludeSelect;
use serde_json::Value;

/// All includes declared on `entity`, resolved against the model.
pub(crate) fn include_selects<'a>(model: &'a BlogModel, entity: &'a ResolvedEntity) -> Vec<IncludeSelect<'a>> {
    entity
        .includes
        .iter()
        .filter_map(|inc| {
            let related = model.entity(&inc.related_table)?;
            Some(IncludeSelect {
                name: &inc.name,
                direction: inc.direction,
                related,
                our_key: &inc.our_key_column,
                their_key: &inc.their_key_column,
            })
        })
        .collect()
}

pub(crate) fn row_id(row: &Value) -> Result<i64, AppError> {
    row.get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| AppError::Internal("stored row has no integer id".into()))
}
