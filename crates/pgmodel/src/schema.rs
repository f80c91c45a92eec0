//! Declarative per-table metadata.
//!
//! A [`TableSchema`] is the immutable column catalog consulted by the query
//! compiler: column names, logical types, nullability/default attributes,
//! string lengths, display aliases, and foreign-key references. Schemas are
//! validated once at construction and then shared (typically via `Arc`) by any
//! number of builders concurrently.

use crate::error::{ModelError, ModelResult};

/// Scalar logical column types, independent of the SQL storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Number,
    Text,
    Uuid,
    Date,
    Time,
    Timestamp,
    Bool,
}

impl ScalarType {
    /// Logical type name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Text => "string",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::Bool => "bool",
        }
    }
}

/// Logical column type: a scalar or an array of scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    Scalar(ScalarType),
    Array(ScalarType),
}

impl LogicalType {
    /// The element type (the scalar itself for scalar columns).
    pub fn element(&self) -> ScalarType {
        match self {
            Self::Scalar(s) | Self::Array(s) => *s,
        }
    }

    /// Whether this is an array type.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Logical type name used in error messages (`string`, `string[]`, ...).
    pub fn name(&self) -> String {
        match self {
            Self::Scalar(s) => s.name().to_string(),
            Self::Array(s) => format!("{}[]", s.name()),
        }
    }
}

/// Column attribute. Exactly one per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAttr {
    /// Part of the primary key (composite keys allowed). Immutable post-insert.
    Primary,
    /// NULL is an acceptable stored value.
    Nullable,
    /// NOT NULL, but the database supplies a default.
    HasDefault,
    /// NOT NULL with no default: required on insert.
    NoDefault,
}

/// Static metadata for one column.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub logical_type: LogicalType,
    pub attr: ColumnAttr,
    pub length: Option<usize>,
    pub alias: Option<String>,
    pub default_literal: Option<String>,
    pub comment: Option<String>,
}

impl Column {
    /// Create a column with the [`ColumnAttr::NoDefault`] attribute.
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            attr: ColumnAttr::NoDefault,
            length: None,
            alias: None,
            default_literal: None,
            comment: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.attr = ColumnAttr::Primary;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.attr = ColumnAttr::Nullable;
        self
    }

    pub fn has_default(mut self) -> Self {
        self.attr = ColumnAttr::HasDefault;
        self
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn default_literal(mut self, literal: impl Into<String>) -> Self {
        self.default_literal = Some(literal.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Name used in error messages: the alias when present, the raw name otherwise.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Whether NULL is acceptable as a stored value.
    pub fn is_nullable(&self) -> bool {
        self.attr == ColumnAttr::Nullable
    }

    /// Whether the column must be supplied on insert.
    pub fn is_required(&self) -> bool {
        matches!(self.attr, ColumnAttr::Primary | ColumnAttr::NoDefault)
    }
}

/// A foreign-key reference used for existence pre-checks on insert.
#[derive(Debug, Clone)]
pub struct Reference {
    /// The referenced table name.
    pub target_table: String,
    /// Pairs of (local column, foreign column).
    pub column_pairs: Vec<(String, String)>,
}

impl Reference {
    pub fn new(
        target_table: impl Into<String>,
        column_pairs: Vec<(impl Into<String>, impl Into<String>)>,
    ) -> Self {
        Self {
            target_table: target_table.into(),
            column_pairs: column_pairs
                .into_iter()
                .map(|(l, f)| (l.into(), f.into()))
                .collect(),
        }
    }
}

/// Validated, immutable table metadata.
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    alias: String,
    columns: Vec<Column>,
    references: Vec<Reference>,
}

impl TableSchema {
    /// Start building a schema for the given table.
    pub fn builder(name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder {
            name: name.into(),
            alias: None,
            columns: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The emission alias (defaults to the table name).
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column, raising a configuration error when absent.
    pub fn require_column(&self, name: &str) -> ModelResult<&Column> {
        self.column(name).ok_or_else(|| {
            ModelError::config(format!("unknown column '{}' on table '{}'", name, self.name))
        })
    }

    /// Primary-key columns in declaration order.
    pub fn primary_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.attr == ColumnAttr::Primary)
            .collect()
    }

    /// Render a fully qualified, quoted column reference: `"alias"."column"`.
    pub fn qualify(&self, column: &str) -> String {
        format!("{}.{}", quote_ident(&self.alias), quote_ident(column))
    }

    /// The quoted FROM clause: `"table"` or `"table" AS "alias"`.
    pub fn from_clause(&self) -> String {
        if self.alias == self.name {
            quote_ident(&self.name)
        } else {
            format!("{} AS {}", quote_ident(&self.name), quote_ident(&self.alias))
        }
    }
}

/// Quote a SQL identifier, escaping embedded quotes by doubling.
pub(crate) fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Builder for [`TableSchema`], enforcing construction invariants.
#[derive(Debug)]
pub struct TableSchemaBuilder {
    name: String,
    alias: Option<String>,
    columns: Vec<Column>,
    references: Vec<Reference>,
}

impl TableSchemaBuilder {
    /// Override the emission alias (defaults to the table name).
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add a column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a foreign-key reference.
    pub fn reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    /// Validate and produce the schema.
    ///
    /// Invariants: at least one column; unique column names; `string` and
    /// `string[]` columns must declare a length; reference column pairs name
    /// existing local columns.
    pub fn finish(self) -> ModelResult<TableSchema> {
        if self.columns.is_empty() {
            return Err(ModelError::config(format!(
                "table '{}' declares no columns",
                self.name
            )));
        }
        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(ModelError::config(format!(
                    "duplicate column '{}' on table '{}'",
                    col.name, self.name
                )));
            }
            if col.logical_type.element() == ScalarType::Text && col.length.is_none() {
                return Err(ModelError::config(format!(
                    "string column '{}' on table '{}' must declare a length",
                    col.name, self.name
                )));
            }
        }
        for reference in &self.references {
            for (local, _) in &reference.column_pairs {
                if !self.columns.iter().any(|c| &c.name == local) {
                    return Err(ModelError::config(format!(
                        "reference to '{}' names unknown local column '{}'",
                        reference.target_table, local
                    )));
                }
            }
        }
        Ok(TableSchema {
            alias: self.alias.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            columns: self.columns,
            references: self.references,
        })
    }
}
