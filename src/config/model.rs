//! The blog data model: `categories` and `posts`.

use crate::config::types::*;

pub const POSTS: &str = "posts";
pub const CATEGORIES: &str = "categories";

const IMAGE_PATTERN: &str = r"^(https?://\S+|/\S*)$";

#[derive(Clone, Debug)]
pub struct BlogModel {
    pub posts: ResolvedEntity,
    pub categories: ResolvedEntity,
}

impl BlogModel {
    pub fn new(schema: &str) -> Self {
        BlogModel {
            posts: posts(schema),
            categories: categories(schema),
        }
    }

    /// Look up an entity by table name (used to resolve includes).
    pub fn entity(&self, table: &str) -> Option<&ResolvedEntity> {
        match table {
            POSTS => Some(&self.posts),
            CATEGORIES => Some(&self.categories),
            _ => None,
        }
    }

    /// Entities in dependency order (referenced tables first).
    pub fn entities(&self) -> [&ResolvedEntity; 2] {
        [&self.categories, &self.posts]
    }
}

fn id_column() -> ColumnInfo {
    ColumnInfo {
        primary_key: true,
        ..ColumnInfo::new("id", "bigint")
    }
}

fn timestamp_columns() -> [ColumnInfo; 2] {
    ["created_at", "updated_at"].map(|name| ColumnInfo {
        default_sql: Some("NOW()".into()),
        ..ColumnInfo::new(name, "timestamptz")
    })
}

fn string_rule(required: bool, min: u32, max: u32) -> ValidationRule {
    ValidationRule {
        required,
        accepts: vec![ValueKind::String],
        min_length: Some(min),
        max_length: Some(max),
        ..Default::default()
    }
}

fn categories(schema: &str) -> ResolvedEntity {
    let mut columns = vec![
        id_column(),
        ColumnInfo {
            unique: true,
            ..ColumnInfo::new("name", "text")
        },
    ];
    columns.extend(timestamp_columns());
    ResolvedEntity {
        schema_name: schema.to_string(),
        table_name: CATEGORIES.to_string(),
        pk_column: "id".into(),
        columns,
        includes: vec![IncludeSpec {
            name: POSTS.into(),
            direction: IncludeDirection::ToMany,
            related_table: POSTS.into(),
            our_key_column: "id".into(),
            their_key_column: "category_id".into(),
        }],
        validation: vec![("name".into(), string_rule(true, 1, 100))],
    }
}

fn posts(schema: &str) -> ResolvedEntity {
    let mut columns = vec![
        id_column(),
        ColumnInfo::new("title", "text"),
        ColumnInfo::new("content", "text"),
        ColumnInfo {
            nullable: true,
            ..ColumnInfo::new("image", "text")
        },
        ColumnInfo {
            references: Some(ForeignKey {
                table: CATEGORIES.into(),
                column: "id".into(),
            }),
            ..ColumnInfo::new("category_id", "bigint")
        },
    ];
    columns.extend(timestamp_columns());
    ResolvedEntity {
        schema_name: schema.to_string(),
        table_name: POSTS.to_string(),
        pk_column: "id".into(),
        columns,
        includes: vec![IncludeSpec {
            name: "category".into(),
            direction: IncludeDirection::ToOne,
            related_table: CATEGORIES.into(),
            our_key_column: "category_id".into(),
            their_key_column: "id".into(),
        }],
        validation: vec![
            ("title".into(), string_rule(true, 1, 255)),
            ("content".into(), string_rule(true, 1, 65_535)),
            (
                "image".into(),
                ValidationRule {
                    pattern: Some(IMAGE_PATTERN.into()),
                    pattern_name: Some("an http(s) URL or absolute path".into()),
                    ..string_rule(false, 0, 2048)
                },
            ),
            (
                "category".into(),
                ValidationRule {
                    accepts: vec![ValueKind::String, ValueKind::PositiveInteger],
                    ..string_rule(true, 1, 100)
                },
            ),
        ],
    }
}
