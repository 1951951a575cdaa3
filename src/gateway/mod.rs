//! Persistence gateway: generic list/read/create/update/delete over a relational store.
//!
//! Rows travel as JSON objects keyed by column name. Includes are attached under their
//! include name (an object for to_one, an array for to_many).

mod memory;
mod postgres;

pub use memory::MemoryGateway;
pub use postgres::PgGateway;

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::sql::IncludeSelect;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Column name -> value, as written to the store.
pub type Row = HashMap<String, Value>;

#[async_trait]
pub trait Gateway: Send + Sync {
    /// All rows matching the exact-match filters, ordered by primary key.
    async fn list(
        &self,
        entity: &ResolvedEntity,
        filters: &[(String, Value)],
        includes: &[IncludeSelect<'_>],
    ) -> Result<Vec<Value>, AppError>;

    async fn read(
        &self,
        entity: &ResolvedEntity,
        id: i64,
        includes: &[IncludeSelect<'_>],
    ) -> Result<Option<Value>, AppError>;

    /// First row (lowest id) matching the filters.
    async fn find_one(&self, entity: &ResolvedEntity, filters: &[(String, Value)]) -> Result<Option<Value>, AppError>;

    /// Insert one row and return it. Unique violations surface as `Conflict`, dangling
    /// references and missing required columns as `Validation`.
    async fn create(&self, entity: &ResolvedEntity, body: &Row) -> Result<Value, AppError>;

    /// Update the columns present in `body`. `None` when no row has that id.
    async fn update(&self, entity: &ResolvedEntity, id: i64, body: &Row) -> Result<Option<Value>, AppError>;

    /// Delete by id and return the deleted row. A row still referenced elsewhere is a `Conflict`.
    async fn delete(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Value>, AppError>;

    /// Cheap liveness check for readiness probes.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Columns of `entity` that carry a foreign key, for error reporting.
fn fk_columns(entity: &ResolvedEntity) -> impl Iterator<Item = &str> {
    entity
        .columns
        .iter()
        .filter(|c| c.references.is_some())
        .map(|c| c.name.as_str())
}
