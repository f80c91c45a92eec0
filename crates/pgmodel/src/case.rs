//! CASE expression generation.
//!
//! [`CaseExpression`] turns a key-to-value mapping over one column into a
//! `CASE WHEN col = <lit> THEN <lit> ... ELSE <lit> END` string. This is a
//! code-generation path, not a parameterized one: literals are embedded in the
//! SQL text with type-directed quoting. Feed it compile-time-known or
//! admin-controlled mappings only, never raw end-user input.

use crate::error::{ModelError, ModelResult};
use crate::expr::{ColumnRef, SchemaSet};
use crate::schema::ScalarType;
use crate::validate;
use crate::value::Value;

/// Builder for a `CASE WHEN` expression keyed on one column.
#[derive(Debug, Clone)]
pub struct CaseExpression {
    column: ColumnRef,
    arms: Vec<(Value, Value)>,
    otherwise: Option<Value>,
}

impl CaseExpression {
    pub fn new(column: impl Into<ColumnRef>) -> Self {
        Self {
            column: column.into(),
            arms: Vec::new(),
            otherwise: None,
        }
    }

    /// Add a `WHEN key THEN value` arm.
    pub fn when(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.arms.push((key.into(), value.into()));
        self
    }

    /// Set the `ELSE` value.
    pub fn otherwise(mut self, value: impl Into<Value>) -> Self {
        self.otherwise = Some(value.into());
        self
    }

    /// Compile to SQL text. No parameters are emitted.
    pub fn compile(&self, schemas: &SchemaSet<'_>) -> ModelResult<String> {
        let (schema, column) = schemas.resolve(&self.column)?;
        if !matches!(
            column.logical_type.element(),
            ScalarType::Text | ScalarType::Number
        ) || column.logical_type.is_array()
        {
            return Err(ModelError::config(format!(
                "CASE key column '{}.{}' must be string or number, got {}",
                schema.name(),
                column.name,
                column.logical_type.name()
            )));
        }
        if self.arms.is_empty() {
            return Err(ModelError::config(format!(
                "CASE on '{}.{}' has no WHEN arms",
                schema.name(),
                column.name
            )));
        }

        let lhs = schema.qualify(&column.name);
        let mut sql = String::from("CASE");
        for (key, value) in &self.arms {
            if !validate::accepts(&column.logical_type, key) {
                return Err(ModelError::config(format!(
                    "CASE key {:?} is not acceptable for column '{}.{}'",
                    key,
                    schema.name(),
                    column.name
                )));
            }
            sql.push_str(&format!(
                " WHEN {lhs} = {} THEN {}",
                quote_literal(key),
                quote_literal(value)
            ));
        }
        if let Some(otherwise) = &self.otherwise {
            sql.push_str(&format!(" ELSE {}", quote_literal(otherwise)));
        }
        sql.push_str(" END");
        Ok(sql)
    }
}

/// Type-directed literal rendering: strings single-quoted with `''` escaping,
/// numbers bare (integral values without a trailing `.0`), booleans as
/// TRUE/FALSE, NULL keyword for null. Arrays are rejected.
fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Array(_) => "NULL".to_string(),
    }
}
