//! Runtime values bound as positional parameters.
//!
//! [`Value`] is a closed representation of the dynamic values that reach the
//! compiler from the service layer. Encoding to the wire format is directed by
//! the *target* PostgreSQL type, so a `Value::Text` holding a canonical UUID
//! or date string binds correctly against a `uuid`/`date` column. Whether a
//! value is *acceptable* for a column is decided earlier, by the validation
//! layer (`validate`); `ToSql` only performs the final conversion.

use std::str::FromStr;

use bytes::BytesMut;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};

/// A dynamic runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Array(Vec<Value>),
}

impl Value {
    /// Convert a JSON value from the service layer.
    ///
    /// Objects are not representable as column values and raise a
    /// configuration error.
    pub fn from_json(value: &serde_json::Value) -> ModelResult<Self> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number).ok_or_else(|| {
                ModelError::config(format!("JSON number {n} is not representable as f64"))
            }),
            serde_json::Value::String(s) => Ok(Self::Text(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<ModelResult<Vec<_>>>()
                .map(Self::Array),
            serde_json::Value::Object(_) => Err(ModelError::config(
                "JSON objects are not representable as column values",
            )),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Number(n) => {
                if *ty == Type::BOOL {
                    (*n != 0.0).to_sql(ty, out)
                } else if *ty == Type::INT2 {
                    (*n as i16).to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    (*n as i32).to_sql(ty, out)
                } else if *ty == Type::INT8 {
                    (*n as i64).to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*n as f32).to_sql(ty, out)
                } else if *ty == Type::NUMERIC {
                    Decimal::try_from(*n)?.to_sql(ty, out)
                } else {
                    n.to_sql(ty, out)
                }
            }
            Value::Text(s) => {
                if *ty == Type::UUID {
                    Uuid::parse_str(s)?.to_sql(ty, out)
                } else if *ty == Type::DATE {
                    parse_date(s)?.to_sql(ty, out)
                } else if *ty == Type::TIME {
                    parse_time(s)?.to_sql(ty, out)
                } else if *ty == Type::TIMESTAMP {
                    parse_timestamp(s)?.to_sql(ty, out)
                } else if *ty == Type::TIMESTAMPTZ {
                    parse_timestamp(s)?.and_utc().to_sql(ty, out)
                } else if *ty == Type::BOOL {
                    (s == "true").to_sql(ty, out)
                } else if *ty == Type::INT2 {
                    (s.parse::<f64>()? as i16).to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    (s.parse::<f64>()? as i32).to_sql(ty, out)
                } else if *ty == Type::INT8 {
                    (s.parse::<f64>()? as i64).to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (s.parse::<f64>()? as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    s.parse::<f64>()?.to_sql(ty, out)
                } else if *ty == Type::NUMERIC {
                    Decimal::from_str(s)?.to_sql(ty, out)
                } else {
                    s.as_str().to_sql(ty, out)
                }
            }
            Value::Array(items) => items.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Acceptability is decided by the validation layer against the
        // column's logical type, not by the wire encoder.
        true
    }

    to_sql_checked!();
}

fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
}

fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_hms_opt(0, 0, 0).expect("midnight")))
}

/// An ordered list of bound parameters.
///
/// The Nth pushed value backs the `$N` placeholder of the statement being
/// assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Value>,
}

impl ParamList {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based placeholder index.
    pub fn push(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.params
    }

    /// Append another list's parameters in order.
    pub fn extend(&mut self, other: ParamList) {
        self.params.extend(other.params);
    }

    pub fn clear(&mut self) {
        self.params.clear();
    }

    /// Parameter references in the shape tokio-postgres expects.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_scalars() {
        assert_eq!(Value::from_json(&serde_json::json!(null)).unwrap(), Value::Null);
        assert_eq!(Value::from_json(&serde_json::json!(true)).unwrap(), Value::Bool(true));
        assert_eq!(Value::from_json(&serde_json::json!(3)).unwrap(), Value::Number(3.0));
        assert_eq!(
            Value::from_json(&serde_json::json!("abc")).unwrap(),
            Value::Text("abc".to_string())
        );
    }

    #[test]
    fn from_json_array() {
        let v = Value::from_json(&serde_json::json!([1, 2])).unwrap();
        assert_eq!(v, Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]));
    }

    #[test]
    fn from_json_object_rejected() {
        assert!(Value::from_json(&serde_json::json!({"a": 1})).unwrap_err().is_config());
    }

    #[test]
    fn param_list_indices_are_one_based() {
        let mut params = ParamList::new();
        assert_eq!(params.push(Value::from(1i64)), 1);
        assert_eq!(params.push(Value::from("x")), 2);
        assert_eq!(params.len(), 2);
        assert_eq!(params.as_refs().len(), 2);
    }

    fn encode(value: &Value, ty: &Type) -> BytesMut {
        let mut out = BytesMut::new();
        match value.to_sql(ty, &mut out).unwrap() {
            IsNull::No => out,
            IsNull::Yes => panic!("unexpected NULL encoding"),
        }
    }

    #[test]
    fn number_encodes_for_bool_target() {
        assert_eq!(encode(&Value::Number(1.0), &Type::BOOL).as_ref(), &[1]);
        assert_eq!(encode(&Value::Number(0.0), &Type::BOOL).as_ref(), &[0]);
    }

    #[test]
    fn text_encodes_for_bool_target() {
        assert_eq!(encode(&Value::Text("true".into()), &Type::BOOL).as_ref(), &[1]);
        assert_eq!(encode(&Value::Text("false".into()), &Type::BOOL).as_ref(), &[0]);
    }

    #[test]
    fn text_encodes_for_number_targets() {
        // Wire widths of the binary formats, not the text length.
        assert_eq!(encode(&Value::Text("42".into()), &Type::INT2).len(), 2);
        assert_eq!(encode(&Value::Text("42".into()), &Type::INT4).len(), 4);
        assert_eq!(encode(&Value::Text("42".into()), &Type::INT8).len(), 8);
        assert_eq!(encode(&Value::Text("-3.5".into()), &Type::FLOAT4).len(), 4);
        assert_eq!(encode(&Value::Text("-3.5".into()), &Type::FLOAT8).len(), 8);
        assert_eq!(
            encode(&Value::Text("42".into()), &Type::INT4).as_ref(),
            42i32.to_be_bytes().as_slice()
        );
    }

    #[test]
    fn numeric_target_uses_decimal_encoding() {
        let direct = {
            let mut out = BytesMut::new();
            Decimal::from_str("12.50").unwrap().to_sql(&Type::NUMERIC, &mut out).unwrap();
            out
        };
        assert_eq!(encode(&Value::Text("12.50".into()), &Type::NUMERIC), direct);
        assert_ne!(encode(&Value::Number(12.5), &Type::NUMERIC).len(), 8);
    }

    #[test]
    fn parse_timestamp_accepts_date_only() {
        assert!(parse_timestamp("2024-01-31").is_ok());
        assert!(parse_timestamp("2024-01-31 12:30:00").is_ok());
        assert!(parse_timestamp("2024-02-30").is_err());
    }
}
