//! Apply the blog model to the database: CREATE SCHEMA, then CREATE TABLE for each entity in
//! dependency order. Idempotent (IF NOT EXISTS); existing tables are left as they are.

use crate::config::{BlogModel, ColumnInfo, ResolvedEntity};
use crate::error::AppError;
use crate::sql::{qualified_table, quoted};
use sqlx::PgPool;

fn column_ddl(entity: &ResolvedEntity, c: &ColumnInfo) -> String {
    if c.primary_key {
        let serial = if c.pg_type == "integer" { "SERIAL" } else { "BIGSERIAL" };
        return format!("{} {} PRIMARY KEY", quoted(&c.name), serial);
    }
    let mut def = format!("{} {}", quoted(&c.name), c.pg_type.to_uppercase());
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(d) = &c.default_sql {
        def.push_str(" DEFAULT ");
        def.push_str(d);
    }
    if c.unique {
        def.push_str(" UNIQUE");
    }
    if let Some(fk) = &c.references {
        def.push_str(&format!(
            " REFERENCES {}.{} ({}) ON DELETE RESTRICT",
            quoted(&entity.schema_name),
            quoted(&fk.table),
            quoted(&fk.column)
        ));
    }
    def
}

/// CREATE TABLE statement for one entity.
pub fn create_table_sql(entity: &ResolvedEntity) -> String {
    let cols: Vec<String> = entity.columns.iter().map(|c| column_ddl(entity, c)).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        qualified_table(entity),
        cols.join(",\n    ")
    )
}

/// Index on each foreign key column (Postgres does not create them implicitly).
pub fn fk_index_sql(entity: &ResolvedEntity) -> Vec<String> {
    entity
        .columns
        .iter()
        .filter(|c| c.references.is_some())
        .map(|c| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("{}_{}_idx", entity.table_name, c.name)),
                qualified_table(entity),
                quoted(&c.name)
            )
        })
        .collect()
}

pub async fn apply_migrations(pool: &PgPool, model: &BlogModel) -> Result<(), AppError> {
    let schema = &model.posts.schema_name;
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    for entity in model.entities() {
        let ddl = create_table_sql(entity);
        tracing::debug!(sql = %ddl, "migration");
        sqlx::query(&ddl).execute(pool).await?;
        for idx in fk_index_sql(entity) {
            sqlx::query(&idx).execute(pool).await?;
        }
    }
    tracing::info!(schema = %schema, "schema ready");
    Ok(())
}
