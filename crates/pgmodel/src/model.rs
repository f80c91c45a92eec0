//! The stateful table-model facade.
//!
//! A [`TableModel`] accumulates SELECT, JOIN, WHERE, GROUP BY, ORDER BY and
//! LIMIT/OFFSET clauses across chained calls, then assembles and executes a
//! single statement, clearing all accumulators afterward. Each clause method
//! compiles its own sub-expression immediately (with local `$1..` numbering)
//! so configuration errors surface at the call site; assembly renumbers every
//! fragment in emission order, keeping placeholders globally `1..N`.
//!
//! One instance must not be shared across concurrently in-flight statements.
//! Instances are cheap (a schema `Arc` plus clause accumulators), so callers
//! needing concurrency create one per statement. Reuse is fine sequentially:
//! execution resets the instance back to idle.

use std::sync::Arc;

use tokio_postgres::Row;
use tracing::debug;

use crate::client::GenericClient;
use crate::error::{DomainCode, Locale, ModelError, ModelResult};
use crate::expr::{self, ColumnRef, Condition, SchemaSet};
use crate::fragment::{Fragment, renumber};
use crate::mutation;
use crate::projection::Projection;
use crate::schema::{TableSchema, quote_ident};
use crate::validate;
use crate::value::{ParamList, Value};

/// Query-builder facade over one table schema.
pub struct TableModel {
    schema: Arc<TableSchema>,
    joined: Vec<Arc<TableSchema>>,
    locale: Locale,
    selects: Vec<Fragment>,
    joins: Vec<Fragment>,
    wheres: Vec<Fragment>,
    groups: Vec<String>,
    orders: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl TableModel {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            joined: Vec::new(),
            locale: Locale::default(),
            selects: Vec::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Set the locale used for domain-error messages.
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn schema_set(&self) -> SchemaSet<'_> {
        let mut set = SchemaSet::new(&self.schema);
        for schema in &self.joined {
            set.join(schema);
        }
        set
    }

    /// Clear all accumulated state, returning the model to idle.
    pub fn reset(&mut self) {
        self.joined.clear();
        self.selects.clear();
        self.joins.clear();
        self.wheres.clear();
        self.groups.clear();
        self.orders.clear();
        self.limit = None;
        self.offset = None;
    }

    // ==================== Clause accumulation ====================

    /// Add one SELECT-list projection.
    pub fn select(&mut self, projection: Projection) -> ModelResult<&mut Self> {
        let frag = {
            let set = self.schema_set();
            projection.compile(&set, 0)?
        };
        self.selects.push(frag);
        Ok(self)
    }

    /// Add a raw SELECT-list expression. Trusted input only.
    pub fn select_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.selects.push(Fragment::raw(sql.into()));
        self
    }

    /// Add a WHERE condition tree. Multiple calls are ANDed together.
    pub fn filter(&mut self, condition: Condition) -> ModelResult<&mut Self> {
        let frag = {
            let set = self.schema_set();
            expr::compile(&condition, &set, 0)?
        };
        if !frag.is_empty() {
            self.wheres.push(frag);
        }
        Ok(self)
    }

    /// Convenience comparison filter with the operator in its SQL spelling.
    pub fn filter_cmp(
        &mut self,
        column: impl Into<ColumnRef>,
        op: &str,
        value: impl Into<expr::Operand>,
    ) -> ModelResult<&mut Self> {
        self.filter(Condition::parse_cmp(column, op, value)?)
    }

    /// Add a raw WHERE fragment. Trusted input only.
    pub fn filter_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.wheres.push(Fragment::raw(sql.into()));
        self
    }

    pub fn inner_join(
        &mut self,
        schema: Arc<TableSchema>,
        on: Condition,
    ) -> ModelResult<&mut Self> {
        self.add_join("INNER", schema, on)
    }

    pub fn left_join(
        &mut self,
        schema: Arc<TableSchema>,
        on: Condition,
    ) -> ModelResult<&mut Self> {
        self.add_join("LEFT", schema, on)
    }

    fn add_join(
        &mut self,
        kind: &str,
        schema: Arc<TableSchema>,
        on: Condition,
    ) -> ModelResult<&mut Self> {
        // Registered before compiling so the ON condition can reference it.
        self.joined.push(Arc::clone(&schema));
        let frag = {
            let set = self.schema_set();
            expr::compile(&on, &set, 0)?
        };
        self.joins.push(Fragment::new(
            format!("{kind} JOIN {} ON {}", schema.from_clause(), frag.text),
            frag.params,
        ));
        Ok(self)
    }

    pub fn group_by(&mut self, column: impl Into<ColumnRef>) -> ModelResult<&mut Self> {
        let qualified = {
            let set = self.schema_set();
            let (schema, col) = set.resolve(&column.into())?;
            schema.qualify(&col.name)
        };
        self.groups.push(qualified);
        Ok(self)
    }

    pub fn order_by_asc(&mut self, column: impl Into<ColumnRef>) -> ModelResult<&mut Self> {
        self.add_order(column.into(), "ASC")
    }

    pub fn order_by_desc(&mut self, column: impl Into<ColumnRef>) -> ModelResult<&mut Self> {
        self.add_order(column.into(), "DESC")
    }

    fn add_order(&mut self, column: ColumnRef, dir: &str) -> ModelResult<&mut Self> {
        let qualified = {
            let set = self.schema_set();
            let (schema, col) = set.resolve(&column)?;
            schema.qualify(&col.name)
        };
        self.orders.push(format!("{qualified} {dir}"));
        Ok(self)
    }

    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(&mut self, n: i64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    /// Pagination helper. `page` is 1-based; both arguments are clamped to >= 1.
    pub fn paginate(&mut self, page: i64, per_page: i64) -> &mut Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.limit = Some(size);
        self.offset = Some((p - 1) * size);
        self
    }

    // ==================== Assembly ====================

    /// Splice locally numbered fragments into `sql`/`params`, renumbering each
    /// by the parameters already emitted.
    fn splice<'a>(
        params: &mut ParamList,
        fragments: impl Iterator<Item = &'a Fragment>,
        separator: &str,
    ) -> String {
        let mut parts = Vec::new();
        for frag in fragments {
            parts.push(renumber(&frag.text, params.len()));
            params.extend(frag.params.clone());
        }
        parts.join(separator)
    }

    fn build_select(&self, count: bool) -> (String, ParamList) {
        // A grouped COUNT must count groups, not rows within them.
        if count && !self.groups.is_empty() {
            let (inner, params) = self.build_grouped_count_inner();
            return (format!("SELECT COUNT(*) FROM ({inner}) AS t"), params);
        }
        let mut params = ParamList::new();

        let select_part = if count {
            "COUNT(*)".to_string()
        } else if self.selects.is_empty() {
            "*".to_string()
        } else {
            Self::splice(&mut params, self.selects.iter(), ", ")
        };

        let mut sql = format!("SELECT {} FROM {}", select_part, self.schema.from_clause());

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&renumber(&join.text, params.len()));
            params.extend(join.params.clone());
        }

        if !self.wheres.is_empty() {
            let where_sql = Self::splice(&mut params, self.wheres.iter(), " AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if !self.groups.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.groups.join(", "));
        }

        if !count {
            if !self.orders.is_empty() {
                sql.push_str(" ORDER BY ");
                sql.push_str(&self.orders.join(", "));
            }
            if let Some(limit) = self.limit {
                sql.push_str(&format!(" LIMIT {limit}"));
            }
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        (sql, params)
    }

    fn build_grouped_count_inner(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let mut sql = format!("SELECT 1 FROM {}", self.schema.from_clause());
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&renumber(&join.text, params.len()));
            params.extend(join.params.clone());
        }
        if !self.wheres.is_empty() {
            let where_sql = Self::splice(&mut params, self.wheres.iter(), " AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        sql.push_str(" GROUP BY ");
        sql.push_str(&self.groups.join(", "));
        (sql, params)
    }

    fn build_insert(&self, values: &[(String, Value)]) -> ModelResult<(String, ParamList)> {
        for (name, _) in values {
            self.schema.require_column(name)?;
        }
        for column in self.schema.columns() {
            let provided = values.iter().any(|(n, v)| n == &column.name && !v.is_null());
            if column.is_required() && !provided {
                return Err(ModelError::domain(
                    DomainCode::MissingField,
                    self.locale,
                    column.display_name(),
                ));
            }
        }

        let mut params = ParamList::new();
        let mut names = Vec::with_capacity(values.len());
        let mut placeholders = Vec::with_capacity(values.len());
        for (name, value) in values {
            let column = self.schema.require_column(name)?;
            validate::check_column(column, value, self.locale)?;
            let idx = params.push(value.clone());
            names.push(quote_ident(name));
            placeholders.push(format!("${idx}"));
        }
        let sql = format!(
            "insert into {} ({}) values ({})",
            quote_ident(self.schema.name()),
            names.join(", "),
            placeholders.join(", ")
        );
        Ok((sql, params))
    }

    fn build_update(&self, changes: &[(String, Value)]) -> ModelResult<(String, ParamList)> {
        let set_frag = mutation::compile_set(&self.schema, changes, 0, self.locale)?;
        let mut params = set_frag.params.clone();
        let mut sql = format!("update {} {}", quote_ident(self.schema.name()), set_frag.text);
        if !self.wheres.is_empty() {
            let where_sql = Self::splice(&mut params, self.wheres.iter(), " AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        Ok((sql, params))
    }

    fn build_delete(&self) -> ModelResult<(String, ParamList)> {
        if self.wheres.is_empty() {
            return Err(ModelError::config(format!(
                "delete on table '{}' has no WHERE clause",
                self.schema.name()
            )));
        }
        let mut params = ParamList::new();
        let where_sql = Self::splice(&mut params, self.wheres.iter(), " AND ");
        let sql = format!(
            "delete from {} WHERE {}",
            quote_ident(self.schema.name()),
            where_sql
        );
        Ok((sql, params))
    }

    /// Equality conditions on the full primary key, validated against the
    /// declared key columns.
    fn pk_condition(&self, pk_values: &[Value]) -> ModelResult<Condition> {
        let pk = self.schema.primary_columns();
        if pk.is_empty() {
            return Err(ModelError::config(format!(
                "table '{}' declares no primary key",
                self.schema.name()
            )));
        }
        if pk.len() != pk_values.len() {
            return Err(ModelError::config(format!(
                "table '{}' expects {} primary-key values, got {}",
                self.schema.name(),
                pk.len(),
                pk_values.len()
            )));
        }
        let children = pk
            .iter()
            .zip(pk_values)
            .map(|(col, value)| {
                Condition::cmp(ColumnRef::new(col.name.as_str()), expr::CmpOp::Eq, value.clone())
            })
            .collect();
        Ok(Condition::and(children))
    }

    /// Assembled SELECT SQL (for debugging; does not execute or reset).
    pub fn to_sql(&self) -> String {
        self.build_select(false).0
    }

    /// Assembled COUNT SQL (for debugging; does not execute or reset).
    pub fn to_count_sql(&self) -> String {
        self.build_select(true).0
    }

    // ==================== Execution ====================

    /// Execute the accumulated SELECT and reset.
    pub async fn execute_select(&mut self, conn: &impl GenericClient) -> ModelResult<Vec<Row>> {
        let (sql, params) = self.build_select(false);
        debug!(table = self.schema.name(), sql = %sql, params = params.len(), "select");
        let result = conn.query(&sql, &params.as_refs()).await;
        self.reset();
        result
    }

    /// Execute the accumulated SELECT as one page, plus a COUNT over the same
    /// joins and filters (projection, sort and limit dropped). Resets after
    /// both statements.
    pub async fn execute_select_for_page(
        &mut self,
        page: i64,
        per_page: i64,
        conn: &impl GenericClient,
    ) -> ModelResult<(Vec<Row>, i64)> {
        self.paginate(page, per_page);
        // Both statements are assembled up front; assembly does not consume
        // state, so no snapshot of the accumulators is needed.
        let (row_sql, row_params) = self.build_select(false);
        let (count_sql, count_params) = self.build_select(true);
        debug!(table = self.schema.name(), sql = %row_sql, params = row_params.len(), "paged select");
        let result = async {
            let rows = conn.query(&row_sql, &row_params.as_refs()).await?;
            let total = conn.query_count(&count_sql, &count_params.as_refs()).await?;
            Ok((rows, total))
        }
        .await;
        self.reset();
        result
    }

    /// Validate and insert one row, returning the affected-row count.
    ///
    /// Before the INSERT, every declared foreign-key reference whose local
    /// columns are all present and non-null is checked with a `COUNT(*)`
    /// query; a zero count raises a conflict-class domain error naming the
    /// referencing columns, and no INSERT is performed.
    pub async fn insert(
        &mut self,
        values: &[(String, Value)],
        conn: &impl GenericClient,
    ) -> ModelResult<u64> {
        let (sql, params) = match self.build_insert(values) {
            Ok(built) => built,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };
        let result = async {
            self.check_references(values, conn).await?;
            debug!(table = self.schema.name(), sql = %sql, params = params.len(), "insert");
            conn.execute(&sql, &params.as_refs()).await
        }
        .await;
        self.reset();
        result
    }

    async fn check_references(
        &self,
        values: &[(String, Value)],
        conn: &impl GenericClient,
    ) -> ModelResult<()> {
        for reference in self.schema.references() {
            let mut params = ParamList::new();
            let mut predicates = Vec::new();
            for (local, foreign) in &reference.column_pairs {
                match values.iter().find(|(n, _)| n == local) {
                    Some((_, value)) if !value.is_null() => {
                        let idx = params.push(value.clone());
                        predicates.push(format!("{} = ${idx}", quote_ident(foreign)));
                    }
                    // A NULL or absent local column opts out of the check.
                    _ => {
                        predicates.clear();
                        break;
                    }
                }
            }
            if predicates.is_empty() {
                continue;
            }
            let sql = format!(
                "SELECT COUNT(*) FROM {} WHERE {}",
                quote_ident(&reference.target_table),
                predicates.join(" AND ")
            );
            debug!(table = self.schema.name(), sql = %sql, "foreign-key pre-check");
            if conn.query_count(&sql, &params.as_refs()).await? == 0 {
                let names = reference
                    .column_pairs
                    .iter()
                    .filter_map(|(local, _)| self.schema.column(local))
                    .map(|c| c.display_name().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(ModelError::domain(
                    DomainCode::ForeignKey,
                    self.locale,
                    &names,
                ));
            }
        }
        Ok(())
    }

    /// Execute an UPDATE with the accumulated WHERE clauses, returning the
    /// affected-row count. SET placeholders come first; WHERE fragments are
    /// renumbered after them.
    pub async fn update(
        &mut self,
        changes: &[(String, Value)],
        conn: &impl GenericClient,
    ) -> ModelResult<u64> {
        let (sql, params) = match self.build_update(changes) {
            Ok(built) => built,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };
        debug!(table = self.schema.name(), sql = %sql, params = params.len(), "update");
        let result = conn.execute(&sql, &params.as_refs()).await;
        self.reset();
        result
    }

    /// Update the row identified by its primary key. Any affected-row count
    /// other than exactly 1 raises a not-found domain error.
    pub async fn update_by_pk(
        &mut self,
        pk_values: &[Value],
        changes: &[(String, Value)],
        conn: &impl GenericClient,
    ) -> ModelResult<u64> {
        let condition = self.pk_condition(pk_values)?;
        self.filter(condition)?;
        let affected = self.update(changes, conn).await?;
        if affected != 1 {
            return Err(ModelError::domain(
                DomainCode::NotFound,
                self.locale,
                self.schema.name(),
            ));
        }
        Ok(affected)
    }

    /// Execute a DELETE with the accumulated WHERE clauses.
    ///
    /// A delete with no WHERE clause is a configuration error.
    pub async fn delete(&mut self, conn: &impl GenericClient) -> ModelResult<u64> {
        let (sql, params) = match self.build_delete() {
            Ok(built) => built,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };
        debug!(table = self.schema.name(), sql = %sql, params = params.len(), "delete");
        let result = conn.execute(&sql, &params.as_refs()).await;
        self.reset();
        result
    }

    /// Delete the row identified by its primary key. Any affected-row count
    /// other than exactly 1 raises a not-found domain error.
    pub async fn delete_by_pk(
        &mut self,
        pk_values: &[Value],
        conn: &impl GenericClient,
    ) -> ModelResult<u64> {
        let condition = self.pk_condition(pk_values)?;
        self.filter(condition)?;
        let affected = self.delete(conn).await?;
        if affected != 1 {
            return Err(ModelError::domain(
                DomainCode::NotFound,
                self.locale,
                self.schema.name(),
            ));
        }
        Ok(affected)
    }
}
