//! Gateway over PostgreSQL using the safe SQL builder.

use super::{fk_columns, Gateway, Row};
use crate::config::ResolvedEntity;
use crate::error::{AppError, FieldError};
use crate::sql::{delete, insert, select_by_id, select_list, select_list_with_includes, update, IncludeSelect, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NOT_NULL_VIOLATION: &str = "23502";

#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        PgGateway { pool }
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, sqlx::Error> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, sqlx::Error> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

#[async_trait]
impl Gateway for PgGateway {
    async fn list(
        &self,
        entity: &ResolvedEntity,
        filters: &[(String, Value)],
        includes: &[IncludeSelect<'_>],
    ) -> Result<Vec<Value>, AppError> {
        let q = if includes.is_empty() {
            select_list(entity, filters, None)
        } else {
            select_list_with_includes(entity, filters, None, includes)
        };
        Ok(self.fetch_all(&q).await?)
    }

    async fn read(
        &self,
        entity: &ResolvedEntity,
        id: i64,
        includes: &[IncludeSelect<'_>],
    ) -> Result<Option<Value>, AppError> {
        let q = if includes.is_empty() {
            select_by_id(entity, &Value::from(id))
        } else {
            let filters = [(entity.pk_column.clone(), Value::from(id))];
            select_list_with_includes(entity, &filters, Some(1), includes)
        };
        Ok(self.fetch_optional(&q).await?)
    }

    async fn find_one(&self, entity: &ResolvedEntity, filters: &[(String, Value)]) -> Result<Option<Value>, AppError> {
        let q = select_list(entity, filters, Some(1));
        Ok(self.fetch_optional(&q).await?)
    }

    async fn create(&self, entity: &ResolvedEntity, body: &Row) -> Result<Value, AppError> {
        let q = insert(entity, body);
        let row = self.fetch_optional(&q).await.map_err(|e| write_error(entity, e))?;
        inserted_row(entity, row)
    }

    async fn update(&self, entity: &ResolvedEntity, id: i64, body: &Row) -> Result<Option<Value>, AppError> {
        let q = update(entity, &Value::from(id), body);
        self.fetch_optional(&q).await.map_err(|e| write_error(entity, e))
    }

    async fn delete(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Value>, AppError> {
        let q = delete(entity, &Value::from(id));
        self.fetch_optional(&q).await.map_err(|e| {
            let (code, column) = violation(&e);
            constraint_error(entity, Statement::Delete(id), code.as_deref(), column.as_deref()).unwrap_or(AppError::Db(e))
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Statement kind a constraint violation came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Statement {
    Write,
    Delete(i64),
}

/// SQLSTATE and, for NOT NULL violations, the offending column.
fn violation(e: &sqlx::Error) -> (Option<String>, Option<String>) {
    match e {
        sqlx::Error::Database(db) => (
            db.code().map(|c| c.into_owned()),
            db.try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .and_then(|pg| pg.column())
                .map(str::to_string),
        ),
        _ => (None, None),
    }
}

/// Client error for a constraint violation, `None` when the error is not one the API maps.
fn constraint_error(entity: &ResolvedEntity, stmt: Statement, code: Option<&str>, column: Option<&str>) -> Option<AppError> {
    match (stmt, code?) {
        (Statement::Delete(id), FOREIGN_KEY_VIOLATION) => {
            Some(AppError::Conflict(format!("{} {} is still referenced", entity.table_name, id)))
        }
        (Statement::Delete(_), _) => None,
        (Statement::Write, UNIQUE_VIOLATION) => Some(AppError::Conflict(format!("{} already exists", entity.table_name))),
        (Statement::Write, FOREIGN_KEY_VIOLATION) => Some(AppError::Validation(
            fk_columns(entity)
                .map(|c| FieldError::new(c, format!("{} references a missing row", c)))
                .collect(),
        )),
        (Statement::Write, NOT_NULL_VIOLATION) => {
            let column = column.unwrap_or("value");
            Some(AppError::invalid(column, format!("{} is required", column)))
        }
        (Statement::Write, _) => None,
    }
}

/// INSERT ... RETURNING always yields the row; an empty result is a server fault.
fn inserted_row(entity: &ResolvedEntity, row: Option<Value>) -> Result<Value, AppError> {
    row.ok_or_else(|| AppError::Internal(format!("insert into {} returned no row", entity.table_name)))
}

/// Map constraint violations on INSERT/UPDATE to client errors.
fn write_error(entity: &ResolvedEntity, e: sqlx::Error) -> AppError {
    let (code, column) = violation(&e);
    constraint_error(entity, Statement::Write, code.as_deref(), column.as_deref()).unwrap_or(AppError::Db(e))
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
