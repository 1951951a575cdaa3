//! Entity metadata: columns, relations and request validation rules.

/// Kind of JSON value a field accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    String,
    /// Integer greater than zero (row ids).
    PositiveInteger,
}

impl ValueKind {
    pub fn describe(self) -> &'static str {
        match self {
            ValueKind::String => "a string",
            ValueKind::PositiveInteger => "a positive integer",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ValidationRule {
    pub required: bool,
    /// Accepted value kinds; empty accepts anything.
    pub accepts: Vec<ValueKind>,
    /// Length bounds apply to the trimmed string, counted in characters.
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub pattern: Option<String>,
    /// Human-readable name of `pattern`, used in messages ("a URL").
    pub pattern_name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    /// PostgreSQL type used for DDL and for casting bound parameters.
    pub pg_type: String,
    pub primary_key: bool,
    pub nullable: bool,
    /// SQL default expression (e.g. NOW()); columns with a default are omitted from INSERT when absent.
    pub default_sql: Option<String>,
    pub unique: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnInfo {
    pub fn new(name: &str, pg_type: &str) -> Self {
        ColumnInfo {
            name: name.to_string(),
            pg_type: pg_type.to_string(),
            primary_key: false,
            nullable: false,
            default_sql: None,
            unique: false,
            references: None,
        }
    }

    pub fn has_default(&self) -> bool {
        self.default_sql.is_some() || self.primary_key
    }
}

/// Direction of a related include: to_one (we hold the FK) or to_many (they hold the FK to us).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncludeDirection {
    ToOne,
    ToMany,
}

#[derive(Clone, Debug)]
pub struct IncludeSpec {
    /// Key the related row(s) appear under in responses.
    pub name: String,
    pub direction: IncludeDirection,
    /// Table name of the related entity (lookup key in the model).
    pub related_table: String,
    /// Our FK for to_one; our PK for to_many.
    pub our_key_column: String,
    /// Their PK for to_one; their FK for to_many.
    pub their_key_column: String,
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub schema_name: String,
    pub table_name: String,
    pub pk_column: String,
    pub columns: Vec<ColumnInfo>,
    pub includes: Vec<IncludeSpec>,
    /// Ordered so validation errors come back in a stable order.
    pub validation: Vec<(String, ValidationRule)>,
}

impl ResolvedEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn pk_type(&self) -> &str {
        self.column(&self.pk_column)
            .map(|c| c.pg_type.as_str())
            .unwrap_or("bigint")
    }
}
