//! Value validation against logical column types.
//!
//! [`accepts`] is the pure predicate used when filtering queries; [`check_column`]
//! is the raising entry point used by mutations (insert/update), producing
//! domain errors that name the offending column.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::error::{DomainCode, Locale, ModelError, ModelResult};
use crate::schema::{Column, LogicalType, ScalarType};
use crate::value::Value;

/// Canonical 8-4-4-4-12 UUID form only. `Uuid::parse_str` is deliberately not
/// used here because it also accepts the simple and URN forms.
fn uuid_pattern() -> &'static Regex {
    static UUID_RE: OnceLock<Regex> = OnceLock::new();
    UUID_RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("invalid built-in uuid regex")
    })
}

/// Whether `value` is acceptable for a column of logical type `ty`.
///
/// NULL is never acceptable here; nullability is a column attribute and is
/// checked by [`check_column`].
pub fn accepts(ty: &LogicalType, value: &Value) -> bool {
    match ty {
        LogicalType::Scalar(scalar) => accepts_scalar(*scalar, value),
        LogicalType::Array(scalar) => match value.as_array() {
            Some(items) => items.iter().all(|v| accepts_scalar(*scalar, v)),
            None => false,
        },
    }
}

fn accepts_scalar(ty: ScalarType, value: &Value) -> bool {
    match ty {
        ScalarType::Number => match value {
            Value::Number(n) => !n.is_nan(),
            Value::Text(s) => !s.is_empty() && s.parse::<f64>().is_ok_and(|n| !n.is_nan()),
            _ => false,
        },
        ScalarType::Bool => match value {
            Value::Bool(_) => true,
            Value::Number(n) => *n == 0.0 || *n == 1.0,
            Value::Text(s) => s == "true" || s == "false",
            _ => false,
        },
        ScalarType::Uuid => match value {
            Value::Text(s) => uuid_pattern().is_match(s),
            _ => false,
        },
        ScalarType::Text => matches!(value, Value::Text(_)),
        ScalarType::Date | ScalarType::Timestamp => match value {
            // chrono rejects calendar-impossible dates like 2024-02-30.
            Value::Text(s) => is_date(s) || is_datetime(s),
            _ => false,
        },
        ScalarType::Time => match value {
            Value::Text(s) => is_time(s),
            _ => false,
        },
    }
}

fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_datetime(s: &str) -> bool {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
}

fn is_time(s: &str) -> bool {
    NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok()
        || NaiveTime::parse_from_str(s, "%H:%M").is_ok()
}

/// Validate a value destined for `column`, raising a domain error on failure.
///
/// Checks, in order: NULL legality (column must be nullable), logical-type
/// acceptance, declared string length.
pub fn check_column(column: &Column, value: &Value, locale: Locale) -> ModelResult<()> {
    if value.is_null() {
        if column.is_nullable() {
            return Ok(());
        }
        return Err(ModelError::domain(
            DomainCode::NotNull,
            locale,
            column.display_name(),
        ));
    }
    if !accepts(&column.logical_type, value) {
        return Err(ModelError::domain(
            DomainCode::InvalidValue,
            locale,
            column.display_name(),
        ));
    }
    check_length(column, value, locale)
}

/// Enforce the column's declared length on text values (array columns check
/// every element).
pub fn check_length(column: &Column, value: &Value, locale: Locale) -> ModelResult<()> {
    let Some(limit) = column.length else {
        return Ok(());
    };
    let over = match value {
        Value::Text(s) => s.chars().count() > limit,
        Value::Array(items) => items
            .iter()
            .any(|v| matches!(v, Value::Text(s) if s.chars().count() > limit)),
        _ => false,
    };
    if over {
        return Err(ModelError::domain(
            DomainCode::Length,
            locale,
            column.display_name(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    fn scalar(ty: ScalarType) -> LogicalType {
        LogicalType::Scalar(ty)
    }

    #[test]
    fn number_accepts_numeric_strings() {
        assert!(accepts(&scalar(ScalarType::Number), &Value::Number(1.5)));
        assert!(accepts(&scalar(ScalarType::Number), &Value::Text("42".into())));
        assert!(accepts(&scalar(ScalarType::Number), &Value::Text("-3.5".into())));
        assert!(!accepts(&scalar(ScalarType::Number), &Value::Text(String::new())));
        assert!(!accepts(&scalar(ScalarType::Number), &Value::Text("abc".into())));
        assert!(!accepts(&scalar(ScalarType::Number), &Value::Text("NaN".into())));
        assert!(!accepts(&scalar(ScalarType::Number), &Value::Number(f64::NAN)));
    }

    #[test]
    fn bool_accepts_zero_one_and_literals() {
        assert!(accepts(&scalar(ScalarType::Bool), &Value::Bool(false)));
        assert!(accepts(&scalar(ScalarType::Bool), &Value::Number(0.0)));
        assert!(accepts(&scalar(ScalarType::Bool), &Value::Number(1.0)));
        assert!(accepts(&scalar(ScalarType::Bool), &Value::Text("true".into())));
        assert!(!accepts(&scalar(ScalarType::Bool), &Value::Number(2.0)));
        assert!(!accepts(&scalar(ScalarType::Bool), &Value::Text("yes".into())));
    }

    #[test]
    fn uuid_accepts_canonical_form_only() {
        let canonical = "6B9CB1AE-0312-4d2a-9c9c-22b96c43a3e4";
        assert!(accepts(&scalar(ScalarType::Uuid), &Value::Text(canonical.into())));
        // Simple (dash-less) form is rejected even though it is a valid UUID.
        assert!(!accepts(
            &scalar(ScalarType::Uuid),
            &Value::Text("6b9cb1ae03124d2a9c9c22b96c43a3e4".into())
        ));
        assert!(!accepts(&scalar(ScalarType::Uuid), &Value::Text("not-a-uuid".into())));
    }

    #[test]
    fn date_requires_calendar_existence() {
        assert!(accepts(&scalar(ScalarType::Date), &Value::Text("2024-02-29".into())));
        assert!(!accepts(&scalar(ScalarType::Date), &Value::Text("2024-02-30".into())));
        assert!(accepts(
            &scalar(ScalarType::Date),
            &Value::Text("2024-02-29 10:00:00".into())
        ));
        assert!(!accepts(&scalar(ScalarType::Date), &Value::Text("2024/02/29".into())));
    }

    #[test]
    fn time_bounds() {
        assert!(accepts(&scalar(ScalarType::Time), &Value::Text("23:59".into())));
        assert!(accepts(&scalar(ScalarType::Time), &Value::Text("00:00:00".into())));
        assert!(!accepts(&scalar(ScalarType::Time), &Value::Text("24:00".into())));
        assert!(!accepts(&scalar(ScalarType::Time), &Value::Text("12:60".into())));
    }

    #[test]
    fn timestamp_union_of_shapes() {
        assert!(accepts(&scalar(ScalarType::Timestamp), &Value::Text("2024-01-01".into())));
        assert!(accepts(
            &scalar(ScalarType::Timestamp),
            &Value::Text("2024-01-01 08:30:00".into())
        ));
        assert!(!accepts(
            &scalar(ScalarType::Timestamp),
            &Value::Text("2024-02-30 08:30:00".into())
        ));
    }

    #[test]
    fn array_checks_every_element() {
        let ty = LogicalType::Array(ScalarType::Number);
        assert!(accepts(&ty, &Value::Array(vec![Value::Number(1.0), Value::Text("2".into())])));
        assert!(!accepts(&ty, &Value::Array(vec![Value::Number(1.0), Value::Text("x".into())])));
        assert!(!accepts(&ty, &Value::Number(1.0)));
    }

    #[test]
    fn null_only_on_nullable_columns() {
        let nullable = Column::new("age", scalar(ScalarType::Number)).nullable();
        let strict = Column::new("age", scalar(ScalarType::Number));
        assert!(check_column(&nullable, &Value::Null, Locale::En).is_ok());
        let err = check_column(&strict, &Value::Null, Locale::En).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Domain {
                code: DomainCode::NotNull,
                ..
            }
        ));
    }

    #[test]
    fn length_limit_enforced() {
        let col = Column::new("name", scalar(ScalarType::Text)).length(3);
        assert!(check_column(&col, &Value::Text("abc".into()), Locale::En).is_ok());
        let err = check_column(&col, &Value::Text("abcd".into()), Locale::En).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Domain {
                code: DomainCode::Length,
                ..
            }
        ));
    }

    #[test]
    fn invalid_value_names_display_alias() {
        let col = Column::new("age", scalar(ScalarType::Number)).alias("user age");
        let err = check_column(&col, &Value::Text("abc".into()), Locale::En).unwrap_err();
        assert_eq!(err.to_string(), "user age has an invalid value");
    }
}
