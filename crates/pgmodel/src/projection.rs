//! SELECT-list compilation.
//!
//! A [`Projection`] describes one output column: a column reference, optionally
//! run through an aggregate, a `to_char` date/time shape cast, and a COALESCE
//! replacement (bound as a parameter). The output key is either an explicit
//! alias or derived from the column name per [`KeyFormat`].

use heck::ToLowerCamelCase;

use crate::error::{ModelError, ModelResult};
use crate::expr::{ColumnRef, SchemaSet};
use crate::fragment::Fragment;
use crate::schema::{ScalarType, quote_ident};
use crate::value::{ParamList, Value};

/// Aggregate function applied to a projected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    fn sql(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// Target shape for date/time re-formatting via `to_char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// `YYYY-MM-DD`
    Date,
    /// `HH24:MI:SS`
    Time,
    /// `YYYY-MM-DD HH24:MI:SS`
    DateTime,
}

impl DateShape {
    fn format(&self) -> &'static str {
        match self {
            Self::Date => "YYYY-MM-DD",
            Self::Time => "HH24:MI:SS",
            Self::DateTime => "YYYY-MM-DD HH24:MI:SS",
        }
    }
}

/// Output key derivation when no explicit alias is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyFormat {
    /// Keep the snake_case column name.
    #[default]
    Snake,
    /// Convert to lowerCamelCase.
    LowerCamel,
}

/// One SELECT-list entry.
#[derive(Debug, Clone)]
pub struct Projection {
    column: ColumnRef,
    aggregate: Option<Aggregate>,
    shape: Option<DateShape>,
    coalesce: Option<Value>,
    alias: Option<String>,
    key_format: KeyFormat,
}

impl Projection {
    pub fn column(column: impl Into<ColumnRef>) -> Self {
        Self {
            column: column.into(),
            aggregate: None,
            shape: None,
            coalesce: None,
            alias: None,
            key_format: KeyFormat::default(),
        }
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    /// Re-format a date/time column through `to_char`.
    pub fn shape(mut self, shape: DateShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Replace NULL with the given value, bound as a parameter.
    pub fn coalesce(mut self, replacement: impl Into<Value>) -> Self {
        self.coalesce = Some(replacement.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn key_format(mut self, key_format: KeyFormat) -> Self {
        self.key_format = key_format;
        self
    }

    /// Compile into a SELECT-list fragment. Placeholders start at `$offset+1`.
    pub fn compile(&self, schemas: &SchemaSet<'_>, offset: usize) -> ModelResult<Fragment> {
        let (schema, column) = schemas.resolve(&self.column)?;
        let mut expr = schema.qualify(&column.name);
        let mut params = ParamList::new();

        if let Some(shape) = self.shape {
            let element = column.logical_type.element();
            if !matches!(
                element,
                ScalarType::Date | ScalarType::Time | ScalarType::Timestamp
            ) {
                return Err(ModelError::config(format!(
                    "to_char shape requires a date/time column, '{}.{}' is {}",
                    schema.name(),
                    column.name,
                    column.logical_type.name()
                )));
            }
            expr = format!("to_char({expr}, '{}')", shape.format());
        }
        if let Some(replacement) = &self.coalesce {
            let idx = offset + params.push(replacement.clone());
            expr = format!("COALESCE({expr}, ${idx})");
        }
        if let Some(aggregate) = self.aggregate {
            expr = format!("{}({expr})", aggregate.sql());
        }

        let key = match &self.alias {
            Some(alias) => alias.clone(),
            None => match self.key_format {
                KeyFormat::Snake => column.name.clone(),
                KeyFormat::LowerCamel => column.name.to_lower_camel_case(),
            },
        };
        Ok(Fragment::new(
            format!("{expr} AS {}", quote_ident(&key)),
            params,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, LogicalType, TableSchema};

    fn users() -> TableSchema {
        TableSchema::builder("users")
            .column(Column::new("id", LogicalType::Scalar(ScalarType::Uuid)).primary())
            .column(Column::new("age", LogicalType::Scalar(ScalarType::Number)).nullable())
            .column(Column::new("created_at", LogicalType::Scalar(ScalarType::Timestamp)))
            .column(Column::new("user_name", LogicalType::Scalar(ScalarType::Text)).length(50))
            .finish()
            .unwrap()
    }

    fn compile(p: Projection) -> Fragment {
        let schema = users();
        let set = SchemaSet::new(&schema);
        p.compile(&set, 0).unwrap()
    }

    #[test]
    fn plain_column_keeps_snake_key() {
        let frag = compile(Projection::column("user_name"));
        assert_eq!(frag.text, "\"users\".\"user_name\" AS \"user_name\"");
        assert!(frag.params.is_empty());
    }

    #[test]
    fn lower_camel_key_format() {
        let frag = compile(Projection::column("user_name").key_format(KeyFormat::LowerCamel));
        assert_eq!(frag.text, "\"users\".\"user_name\" AS \"userName\"");
    }

    #[test]
    fn explicit_alias_wins_over_key_format() {
        let frag = compile(
            Projection::column("user_name")
                .key_format(KeyFormat::LowerCamel)
                .alias("display"),
        );
        assert!(frag.text.ends_with("AS \"display\""));
    }

    #[test]
    fn aggregate_wraps_expression() {
        let frag = compile(Projection::column("age").aggregate(Aggregate::Avg));
        assert_eq!(frag.text, "AVG(\"users\".\"age\") AS \"age\"");
    }

    #[test]
    fn date_shape_emits_to_char() {
        let frag = compile(Projection::column("created_at").shape(DateShape::Date));
        assert_eq!(
            frag.text,
            "to_char(\"users\".\"created_at\", 'YYYY-MM-DD') AS \"created_at\""
        );
        let frag = compile(Projection::column("created_at").shape(DateShape::DateTime));
        assert!(frag.text.contains("'YYYY-MM-DD HH24:MI:SS'"));
    }

    #[test]
    fn shape_on_non_date_column_raises() {
        let schema = users();
        let set = SchemaSet::new(&schema);
        let err = Projection::column("age")
            .shape(DateShape::Time)
            .compile(&set, 0)
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn coalesce_binds_replacement_as_parameter() {
        let frag = compile(Projection::column("age").coalesce(0i64));
        assert_eq!(frag.text, "COALESCE(\"users\".\"age\", $1) AS \"age\"");
        assert_eq!(frag.params.values(), &[Value::Number(0.0)]);
    }

    #[test]
    fn coalesce_respects_offset() {
        let schema = users();
        let set = SchemaSet::new(&schema);
        let frag = Projection::column("age").coalesce(0i64).compile(&set, 3).unwrap();
        assert!(frag.text.contains("$4"));
    }

    #[test]
    fn aggregate_applies_outside_coalesce() {
        let frag = compile(
            Projection::column("age")
                .coalesce(0i64)
                .aggregate(Aggregate::Sum),
        );
        assert_eq!(frag.text, "SUM(COALESCE(\"users\".\"age\", $1)) AS \"age\"");
    }

    #[test]
    fn unknown_column_raises() {
        let schema = users();
        let set = SchemaSet::new(&schema);
        assert!(Projection::column("nope").compile(&set, 0).unwrap_err().is_config());
    }
}
