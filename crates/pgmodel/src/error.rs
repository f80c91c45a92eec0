//! Error types for pgmodel.
//!
//! Errors fall into two disjoint classes:
//!
//! - **Configuration errors** ([`ModelError::Config`]): programmer misuse of the
//!   query compiler (unknown column, illegal operator for a type, mutating a
//!   primary key, ...). These indicate a bug in query construction and are
//!   expected to surface in development, never in production traffic.
//! - **Domain errors** ([`ModelError::Domain`]): bad data reaching a mutation.
//!   They carry a machine-readable [`DomainCode`] and a message templated per
//!   [`Locale`] with the offending column's display name, so callers can map
//!   them to API-level semantics.

use thiserror::Error;

/// Result type alias for pgmodel operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Message locale for domain errors.
///
/// Passed explicitly at construction time (no environment probing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ja,
}

/// Machine-readable domain error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainCode {
    /// NULL written to a non-nullable column.
    NotNull,
    /// String value exceeds the column's declared length.
    Length,
    /// Value does not match the column's logical type.
    InvalidValue,
    /// Required column missing from an insert.
    MissingField,
    /// Foreign-key pre-check found no referenced row (conflict-class).
    ForeignKey,
    /// Update/delete by primary key matched no row.
    NotFound,
}

impl DomainCode {
    /// Stable machine-readable code string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotNull => "not_null_violation",
            Self::Length => "length_violation",
            Self::InvalidValue => "invalid_value",
            Self::MissingField => "missing_field",
            Self::ForeignKey => "foreign_key_violation",
            Self::NotFound => "not_found",
        }
    }

    fn template(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::NotNull, Locale::En) => "{name} must not be null",
            (Self::NotNull, Locale::Ja) => "{name}にnullは指定できません",
            (Self::Length, Locale::En) => "{name} exceeds the maximum length",
            (Self::Length, Locale::Ja) => "{name}が最大文字数を超えています",
            (Self::InvalidValue, Locale::En) => "{name} has an invalid value",
            (Self::InvalidValue, Locale::Ja) => "{name}の値が不正です",
            (Self::MissingField, Locale::En) => "{name} is required",
            (Self::MissingField, Locale::Ja) => "{name}は必須です",
            (Self::ForeignKey, Locale::En) => "{name} references a missing row",
            (Self::ForeignKey, Locale::Ja) => "{name}の参照先が存在しません",
            (Self::NotFound, Locale::En) => "no row found for {name}",
            (Self::NotFound, Locale::Ja) => "{name}に該当する行が存在しません",
        }
    }

    /// Render the localized message with the column display name substituted.
    pub fn message(&self, locale: Locale, display_name: &str) -> String {
        self.template(locale).replace("{name}", display_name)
    }
}

/// Error types for query compilation and execution.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Programmer misuse of the compiler (configuration-class).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad data reaching a mutation (domain-class).
    #[error("{message}")]
    Domain {
        code: DomainCode,
        column: String,
        message: String,
    },

    /// Query execution error from the underlying connection.
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation reported by the database.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Pool error.
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl ModelError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a domain error for a column, with a localized message.
    pub fn domain(code: DomainCode, locale: Locale, display_name: &str) -> Self {
        Self::Domain {
            code,
            column: display_name.to_string(),
            message: code.message(locale, display_name),
        }
    }

    /// Check if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a not-found domain error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Domain {
                code: DomainCode::NotFound,
                ..
            }
        )
    }

    /// Check if this is a conflict-class error (foreign key or unique).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Domain {
                code: DomainCode::ForeignKey,
                ..
            } | Self::UniqueViolation(_)
        )
    }

    /// Parse a tokio_postgres error into a more specific ModelError.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{constraint}: {message}")),
                "23503" => {
                    return Self::Domain {
                        code: DomainCode::ForeignKey,
                        column: constraint.to_string(),
                        message: format!("{constraint}: {message}"),
                    };
                }
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for ModelError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
