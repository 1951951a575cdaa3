//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from entity metadata.

use crate::config::{IncludeDirection, ResolvedEntity};
use serde_json::Value;
use std::collections::HashMap;

/// One include for a single-query select: response key, direction, related entity, our key column, their key column.
pub struct IncludeSelect<'a> {
    pub name: &'a str,
    pub direction: IncludeDirection,
    pub related: &'a ResolvedEntity,
    pub our_key: &'a str,
    pub their_key: &'a str,
}

/// Quote identifier for PostgreSQL (identifiers only ever come from the model).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn qualified_table(entity: &ResolvedEntity) -> String {
    format!("{}.{}", quoted(&entity.schema_name), quoted(&entity.table_name))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value and return its placeholder, cast to `pg_type`.
    fn push_param(&mut self, v: Value, pg_type: &str) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), pg_type)
    }
}

/// SELECT list, every column as-is, optionally prefixed with a table alias.
fn select_column_list(entity: &ResolvedEntity, alias: Option<&str>) -> String {
    entity
        .columns
        .iter()
        .map(|c| match alias {
            Some(a) => format!("{}.{} AS {}", a, quoted(&c.name), quoted(&c.name)),
            None => quoted(&c.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(q: &mut QueryBuf, entity: &ResolvedEntity, filters: &[(String, Value)], alias: Option<&str>) -> String {
    let mut parts = Vec::new();
    for (col, val) in filters {
        let Some(c) = entity.column(col) else { continue };
        let lhs = match alias {
            Some(a) => format!("{}.{}", a, quoted(col)),
            None => quoted(col),
        };
        let ph = q.push_param(val.clone(), &c.pg_type);
        parts.push(format!("{} = {}", lhs, ph));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT by primary key.
pub fn select_by_id(entity: &ResolvedEntity, id: &Value) -> QueryBuf {
    select_list(entity, &[(entity.pk_column.clone(), id.clone())], Some(1))
}

/// SELECT with exact-match filters (unknown columns are ignored), ORDER BY pk, optional LIMIT.
pub fn select_list(entity: &ResolvedEntity, filters: &[(String, Value)], limit: Option<u32>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);
    let where_sql = where_clause(&mut q, entity, filters, None);
    let limit_sql = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}{}",
        select_column_list(entity, None),
        table,
        where_sql,
        quoted(&entity.pk_column),
        limit_sql
    );
    q
}

/// SELECT with includes in a single query: main table aliased as "main", each include as a scalar
/// subquery (row_to_json for to_one, json_agg for to_many).
pub fn select_list_with_includes(
    entity: &ResolvedEntity,
    filters: &[(String, Value)],
    limit: Option<u32>,
    includes: &[IncludeSelect<'_>],
) -> QueryBuf {
    const MAIN_ALIAS: &str = "main";
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);

    let mut select_parts = vec![select_column_list(entity, Some(MAIN_ALIAS))];
    for inc in includes {
        let rel_table = qualified_table(inc.related);
        let rel_cols = select_column_list(inc.related, None);
        let sub_from = format!(
            "{} WHERE {} = {}.{}",
            rel_table,
            quoted(inc.their_key),
            MAIN_ALIAS,
            quoted(inc.our_key)
        );
        let subquery = match inc.direction {
            IncludeDirection::ToOne => format!("(SELECT row_to_json(sub) FROM (SELECT {} FROM {}) sub)", rel_cols, sub_from),
            IncludeDirection::ToMany => format!(
                "(SELECT COALESCE(json_agg(row_to_json(sub) ORDER BY sub.{}), '[]'::json) FROM (SELECT {} FROM {}) sub)",
                quoted(&inc.related.pk_column),
                rel_cols,
                sub_from
            ),
        };
        select_parts.push(format!("{} AS {}", subquery, quoted(inc.name)));
    }

    let where_sql = where_clause(&mut q, entity, filters, Some(MAIN_ALIAS));
    let limit_sql = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {} {}{} ORDER BY {}.{}{}",
        select_parts.join(", "),
        table,
        MAIN_ALIAS,
        where_sql,
        MAIN_ALIAS,
        quoted(&entity.pk_column),
        limit_sql
    );
    q
}

/// INSERT from body. The primary key is always generated; columns with a default are omitted
/// when the body does not provide them.
pub fn insert(entity: &ResolvedEntity, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &entity.columns {
        if c.primary_key {
            continue;
        }
        let val = body.get(&c.name).cloned();
        if val.is_none() && c.has_default() {
            continue;
        }
        placeholders.push(q.push_param(val.unwrap_or(Value::Null), &c.pg_type));
        cols.push(quoted(&c.name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(entity),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(entity, None)
    );
    q
}

/// UPDATE by id: SET only known, non-key columns present in body, plus updated_at.
/// Columns are set in model order so the statement text is stable.
pub fn update(entity: &ResolvedEntity, id: &Value, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &entity.columns {
        if c.primary_key || c.name == "created_at" || c.name == "updated_at" {
            continue;
        }
        let Some(v) = body.get(&c.name) else { continue };
        let rhs = q.push_param(v.clone(), &c.pg_type);
        sets.push(format!("{} = {}", quoted(&c.name), rhs));
    }
    if entity.column("updated_at").is_some() {
        sets.push(format!("{} = NOW()", quoted("updated_at")));
    }
    let id_ph = q.push_param(id.clone(), entity.pk_type());
    if sets.is_empty() {
        q.sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            select_column_list(entity, None),
            qualified_table(entity),
            quoted(&entity.pk_column),
            id_ph
        );
        return q;
    }
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(entity),
        sets.join(", "),
        quoted(&entity.pk_column),
        id_ph,
        select_column_list(entity, None)
    );
    q
}

/// DELETE by id, returning the deleted row.
pub fn delete(entity: &ResolvedEntity, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_ph = q.push_param(id.clone(), entity.pk_type());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        qualified_table(entity),
        quoted(&entity.pk_column),
        id_ph,
        select_column_list(entity, None)
    );
    q
}
