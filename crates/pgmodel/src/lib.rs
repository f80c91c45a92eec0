//! # pgmodel
//!
//! Declarative PostgreSQL table models with a safe query/expression compiler.
//!
//! A [`TableSchema`] describes a table's columns (logical types, nullability,
//! defaults, lengths, display aliases) and foreign-key references. A
//! [`TableModel`] accumulates SELECT/JOIN/WHERE/GROUP/ORDER clauses over that
//! schema, compiles every value into positional `$N` parameters, and executes
//! one statement per call through any [`GenericClient`] (plain client,
//! transaction, or pooled client).
//!
//! ## Features
//!
//! - **Schema-checked compilation**: unknown columns, illegal operators for a
//!   type, and cross-column type mismatches fail before any I/O
//! - **Validated mutations**: insert/update re-validate every value against
//!   the column's logical type, NULL legality, and declared length
//! - **Foreign-key pre-checks**: inserts verify referenced rows exist and
//!   raise a conflict-class error naming the referencing columns
//! - **Safe defaults**: DELETE requires WHERE, primary keys are immutable
//! - **Localized domain errors**: machine-readable codes with `En`/`Ja`
//!   message templates naming the offending column
//!
//! ```ignore
//! use std::sync::Arc;
//! use pgmodel::{
//!     CmpOp, Column, Condition, LogicalType, Projection, ScalarType, TableModel, TableSchema,
//! };
//!
//! let users = Arc::new(
//!     TableSchema::builder("users")
//!         .column(Column::new("id", LogicalType::Scalar(ScalarType::Uuid)).primary())
//!         .column(Column::new("age", LogicalType::Scalar(ScalarType::Number)))
//!         .column(Column::new("name", LogicalType::Scalar(ScalarType::Text)).length(50))
//!         .finish()?,
//! );
//!
//! let mut model = TableModel::new(users);
//! let rows = model
//!     .select(Projection::column("name"))?
//!     .filter(Condition::and(vec![
//!         Condition::cmp("age", CmpOp::Gte, 18i64),
//!         Condition::cmp("name", CmpOp::Like, "Jo"),
//!     ]))?
//!     .order_by_asc("name")?
//!     .execute_select(&client)
//!     .await?;
//! ```

pub mod case;
pub mod client;
pub mod error;
pub mod expr;
pub mod fragment;
pub mod model;
pub mod mutation;
pub mod projection;
pub mod schema;
pub mod validate;
pub mod value;

mod translate;

pub use case::CaseExpression;
pub use client::GenericClient;
pub use error::{DomainCode, Locale, ModelError, ModelResult};
pub use expr::{BoolOp, CmpOp, ColumnRef, Condition, Operand, SchemaSet};
pub use fragment::Fragment;
pub use model::TableModel;
pub use mutation::compile_set;
pub use projection::{Aggregate, DateShape, KeyFormat, Projection};
pub use schema::{Column, ColumnAttr, LogicalType, Reference, ScalarType, TableSchema};
pub use value::{ParamList, Value};
