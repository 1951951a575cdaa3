//! In-process gateway with the same constraints as the Postgres schema: generated ids,
//! unique columns, NOT NULL columns, foreign keys with ON DELETE RESTRICT.

use super::{Gateway, Row};
use crate::config::{BlogModel, IncludeDirection, ResolvedEntity};
use crate::error::{AppError, FieldError};
use crate::sql::IncludeSelect;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Map<String, Value>>,
}

type Tables = HashMap<String, Table>;

pub struct MemoryGateway {
    model: BlogModel,
    tables: RwLock<Tables>,
}

impl MemoryGateway {
    pub fn new(model: BlogModel) -> Self {
        MemoryGateway {
            model,
            tables: RwLock::new(HashMap::new()),
        }
    }

    fn read_tables(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }

    fn write_tables(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }

    /// Foreign keys in the whole model that point at `table`: (referencing table, column).
    fn referencing(&self, table: &str) -> Vec<(String, String)> {
        self.model
            .entities()
            .iter()
            .flat_map(|e| {
                e.columns
                    .iter()
                    .filter(|c| c.references.as_ref().is_some_and(|fk| fk.table == table))
                    .map(|c| (e.table_name.clone(), c.name.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

fn same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => match (n.as_i64(), m.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => n.as_f64() == m.as_f64(),
        },
        _ => a == b,
    }
}

fn matches(row: &Map<String, Value>, filters: &[(String, Value)]) -> bool {
    filters
        .iter()
        .all(|(col, val)| row.get(col).is_some_and(|v| same(v, val)))
}

fn now() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339())
}

/// Check NOT NULL, foreign key and unique constraints for a row about to be stored.
fn check_row(tables: &Tables, entity: &ResolvedEntity, row: &Map<String, Value>, self_id: Option<i64>) -> Result<(), AppError> {
    let mut errors = Vec::new();
    for c in &entity.columns {
        let v = row.get(&c.name).unwrap_or(&Value::Null);
        if v.is_null() {
            if !c.nullable && !c.has_default() {
                errors.push(FieldError::new(c.name.as_str(), format!("{} is required", c.name)));
            }
            continue;
        }
        if let Some(fk) = &c.references {
            let exists = tables
                .get(&fk.table)
                .is_some_and(|t| t.rows.values().any(|r| r.get(&fk.column).is_some_and(|x| same(x, v))));
            if !exists {
                errors.push(FieldError::new(c.name.as_str(), format!("{} references a missing row", c.name)));
            }
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    if let Some(table) = tables.get(&entity.table_name) {
        for c in entity.columns.iter().filter(|c| c.unique) {
            let Some(v) = row.get(&c.name).filter(|v| !v.is_null()) else { continue };
            let taken = table
                .rows
                .iter()
                .any(|(id, r)| Some(*id) != self_id && r.get(&c.name).is_some_and(|x| same(x, v)));
            if taken {
                return Err(AppError::Conflict(format!("{} already exists", entity.table_name)));
            }
        }
    }
    Ok(())
}

/// Project a stored row onto the entity's columns and attach includes.
fn render(tables: &Tables, entity: &ResolvedEntity, row: &Map<String, Value>, includes: &[IncludeSelect<'_>]) -> Value {
    let mut out = Map::new();
    for c in &entity.columns {
        out.insert(c.name.clone(), row.get(&c.name).cloned().unwrap_or(Value::Null));
    }
    for inc in includes {
        let key = row.get(inc.our_key).cloned().unwrap_or(Value::Null);
        let related_rows = tables
            .get(&inc.related.table_name)
            .map(|t| {
                t.rows
                    .values()
                    .filter(|r| !key.is_null() && r.get(inc.their_key).is_some_and(|v| same(v, &key)))
                    .map(|r| render(tables, inc.related, r, &[]))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let value = match inc.direction {
            IncludeDirection::ToOne => related_rows.into_iter().next().unwrap_or(Value::Null),
            IncludeDirection::ToMany => Value::Array(related_rows),
        };
        out.insert(inc.name.to_string(), value);
    }
    Value::Object(out)
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn list(
        &self,
        entity: &ResolvedEntity,
        filters: &[(String, Value)],
        includes: &[IncludeSelect<'_>],
    ) -> Result<Vec<Value>, AppError> {
        let tables = self.read_tables()?;
        let Some(table) = tables.get(&entity.table_name) else { return Ok(Vec::new()) };
        Ok(table
            .rows
            .values()
            .filter(|r| matches(r, filters))
            .map(|r| render(&tables, entity, r, includes))
            .collect())
    }

    async fn read(
        &self,
        entity: &ResolvedEntity,
        id: i64,
        includes: &[IncludeSelect<'_>],
    ) -> Result<Option<Value>, AppError> {
        let tables = self.read_tables()?;
        Ok(tables
            .get(&entity.table_name)
            .and_then(|t| t.rows.get(&id))
            .map(|r| render(&tables, entity, r, includes)))
    }

    async fn find_one(&self, entity: &ResolvedEntity, filters: &[(String, Value)]) -> Result<Option<Value>, AppError> {
        let tables = self.read_tables()?;
        Ok(tables.get(&entity.table_name).and_then(|t| {
            t.rows
                .values()
                .find(|r| matches(r, filters))
                .map(|r| render(&tables, entity, r, &[]))
        }))
    }

    async fn create(&self, entity: &ResolvedEntity, body: &Row) -> Result<Value, AppError> {
        let mut tables = self.write_tables()?;
        let mut row = Map::new();
        for c in entity.columns.iter().filter(|c| !c.primary_key) {
            match body.get(&c.name) {
                Some(v) => {
                    row.insert(c.name.clone(), v.clone());
                }
                None if c.default_sql.is_some() => {
                    row.insert(c.name.clone(), now());
                }
                None => {
                    row.insert(c.name.clone(), Value::Null);
                }
            }
        }
        check_row(&tables, entity, &row, None)?;

        let table = tables.entry(entity.table_name.clone()).or_default();
        table.next_id += 1;
        let id = table.next_id;
        row.insert(entity.pk_column.clone(), Value::from(id));
        table.rows.insert(id, row.clone());
        Ok(render(&tables, entity, &row, &[]))
    }

    async fn update(&self, entity: &ResolvedEntity, id: i64, body: &Row) -> Result<Option<Value>, AppError> {
        let mut tables = self.write_tables()?;
        let Some(existing) = tables.get(&entity.table_name).and_then(|t| t.rows.get(&id)) else {
            return Ok(None);
        };
        let mut row = existing.clone();
        let mut changed = false;
        for c in &entity.columns {
            if c.primary_key || c.name == "created_at" || c.name == "updated_at" {
                continue;
            }
            if let Some(v) = body.get(&c.name) {
                row.insert(c.name.clone(), v.clone());
                changed = true;
            }
        }
        if !changed {
            return Ok(Some(render(&tables, entity, &row, &[])));
        }
        if entity.column("updated_at").is_some() {
            row.insert("updated_at".into(), now());
        }
        check_row(&tables, entity, &row, Some(id))?;
        let out = render(&tables, entity, &row, &[]);
        if let Some(table) = tables.get_mut(&entity.table_name) {
            table.rows.insert(id, row);
        }
        Ok(Some(out))
    }

    async fn delete(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Value>, AppError> {
        let mut tables = self.write_tables()?;
        let Some(existing) = tables.get(&entity.table_name).and_then(|t| t.rows.get(&id)) else {
            return Ok(None);
        };
        let key = existing.get(&entity.pk_column).cloned().unwrap_or(Value::Null);
        for (table, column) in self.referencing(&entity.table_name) {
            let in_use = tables
                .get(&table)
                .is_some_and(|t| t.rows.values().any(|r| r.get(&column).is_some_and(|v| same(v, &key))));
            if in_use {
                return Err(AppError::Conflict(format!("{} {} is still referenced", entity.table_name, id)));
            }
        }
        let removed = tables
            .get_mut(&entity.table_name)
            .and_then(|t| t.rows.remove(&id));
        Ok(removed.map(|r| render(&tables, entity, &r, &[])))
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.read_tables().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn gateway() -> (MemoryGateway, BlogModel) {
        let model = BlogModel::new("blog");
        (MemoryGateway::new(model.clone()), model)
    }

    #[tokio::test]
    async fn ids_are_generated_in_order() {
        let (gw, model) = gateway();
        let a = gw.create(&model.categories, &row(&[("name", json!("rust"))])).await.unwrap();
        let b = gw.create(&model.categories, &row(&[("name", json!("go"))])).await.unwrap();
        assert_eq!(a["id"], json!(1));
        assert_eq!(b["id"], json!(2));
        assert!(a["created_at"].is_string());
        let names: Vec<Value> = gw
            .list(&model.categories, &[], &[])
            .await
            .unwrap()
            .into_iter()
            .map(|r| r["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("rust"), json!("go")]);
    }

    #[tokio::test]
    async fn unique_name_conflicts() {
        let (gw, model) = gateway();
        gw.create(&model.categories, &row(&[("name", json!("rust"))])).await.unwrap();
        let err = gw.create(&model.categories, &row(&[("name", json!("rust"))])).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn post_requires_existing_category() {
        let (gw, model) = gateway();
        let err = gw
            .create(
                &model.posts,
                &row(&[("title", json!("t")), ("content", json!("c")), ("category_id", json!(99))]),
            )
            .await
            .unwrap_err();
        match err {
            AppError::Validation(errors) => assert_eq!(errors[0].field, "category_id"),
            other => panic!("unexpected {:?}", other),
        }

        let err = gw
            .create(&model.posts, &row(&[("title", json!("t")), ("content", json!("c"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn includes_are_rendered() {
        let (gw, model) = gateway();
        gw.create(&model.categories, &row(&[("name", json!("rust"))])).await.unwrap();
        let post = gw
            .create(
                &model.posts,
                &row(&[("title", json!("t")), ("content", json!("c")), ("category_id", json!(1))]),
            )
            .await
            .unwrap();
        assert_eq!(post["image"], Value::Null);

        let to_one = IncludeSelect {
            name: "category",
            direction: IncludeDirection::ToOne,
            related: &model.categories,
            our_key: "category_id",
            their_key: "id",
        };
        let read = gw.read(&model.posts, 1, &[to_one]).await.unwrap().unwrap();
        assert_eq!(read["category"]["name"], json!("rust"));

        let to_many = IncludeSelect {
            name: "posts",
            direction: IncludeDirection::ToMany,
            related: &model.posts,
            our_key: "id",
            their_key: "category_id",
        };
        let cat = gw.read(&model.categories, 1, &[to_many]).await.unwrap().unwrap();
        assert_eq!(cat["posts"].as_array().unwrap().len(), 1);
        assert_eq!(cat["posts"][0]["title"], json!("t"));
    }

    #[tokio::test]
    async fn referenced_rows_cannot_be_deleted() {
        let (gw, model) = gateway();
        gw.create(&model.categories, &row(&[("name", json!("rust"))])).await.unwrap();
        gw.create(
            &model.posts,
            &row(&[("title", json!("t")), ("content", json!("c")), ("category_id", json!(1))]),
        )
        .await
        .unwrap();
        let err = gw.delete(&model.categories, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert!(gw.delete(&model.posts, 1).await.unwrap().is_some());
        assert!(gw.delete(&model.posts, 1).await.unwrap().is_none());
        assert!(gw.delete(&model.categories, 1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_changes_only_given_columns() {
        let (gw, model) = gateway();
        gw.create(&model.categories, &row(&[("name", json!("rust"))])).await.unwrap();
        gw.create(
            &model.posts,
            &row(&[("title", json!("t")), ("content", json!("c")), ("category_id", json!(1))]),
        )
        .await
        .unwrap();
        let updated = gw
            .update(&model.posts, 1, &row(&[("title", json!("new")), ("id", json!(5))]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["id"], json!(1));
        assert_eq!(updated["title"], json!("new"));
        assert_eq!(updated["content"], json!("c"));
        assert!(gw.update(&model.posts, 2, &row(&[("title", json!("x"))])).await.unwrap().is_none());
    }
}
