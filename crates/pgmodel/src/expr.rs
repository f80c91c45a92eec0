//! The condition-tree compiler.
//!
//! [`Condition`] is the recursive AND/OR/comparison structure representing a
//! WHERE clause before compilation. [`compile`] turns a tree into a
//! [`Fragment`] with globally correct `$n` placeholders, consulting the table
//! schemas for operator legality and value acceptance. Parameter indices are
//! computed at build time by threading a running offset through the recursion;
//! no string replacement is involved.
//!
//! All structural and type errors raise [`ModelError::Config`] immediately:
//! they indicate a mistake in query construction, not bad user input.

use std::str::FromStr;

use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::schema::{Column, LogicalType, ScalarType, TableSchema};
use crate::translate::translate_chain;
use crate::validate;
use crate::value::{ParamList, Value};

/// Reference to a column, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    /// Unqualified reference, resolved against the base table.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    /// Reference qualified by a table name or alias.
    pub fn on(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// Parse `"column"` or `"table.column"`.
    pub fn parse(s: &str) -> Self {
        match s.split_once('.') {
            Some((table, column)) => Self::on(table, column),
            None => Self::new(s),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    H2fLike,
    H2fIlike,
    In,
    NotIn,
    /// Scalar membership in an array column: `$n = ANY(col)`.
    Any,
    /// Array containment: `col @> $n`.
    Contains,
    /// Array overlap: `col && $n`.
    Overlaps,
}

impl CmpOp {
    fn sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "like",
            Self::Ilike => "ilike",
            Self::H2fLike => "like",
            Self::H2fIlike => "ilike",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Any => "any",
            Self::Contains => "@>",
            Self::Overlaps => "&&",
        }
    }
}

impl FromStr for CmpOp {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        Ok(match s {
            "=" => Self::Eq,
            "!=" | "<>" => Self::Ne,
            ">" => Self::Gt,
            ">=" => Self::Gte,
            "<" => Self::Lt,
            "<=" => Self::Lte,
            "like" => Self::Like,
            "ilike" => Self::Ilike,
            "h2f_like" => Self::H2fLike,
            "h2f_ilike" => Self::H2fIlike,
            "in" => Self::In,
            "not in" => Self::NotIn,
            "any" => Self::Any,
            "@>" => Self::Contains,
            "&&" => Self::Overlaps,
            other => return Err(ModelError::config(format!("unknown operator '{other}'"))),
        })
    }
}

/// Logical connective for condition groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    fn joiner(&self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Column(ColumnRef),
    Null,
}

impl<T: Into<Value>> From<T> for Operand {
    fn from(v: T) -> Self {
        Self::Value(v.into())
    }
}

/// A condition tree node. Built fresh per builder call, consumed by
/// [`compile`], never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Raw SQL passed through verbatim. Trusted input only.
    Raw(String),
    /// A single comparison.
    Cmp {
        left: ColumnRef,
        op: CmpOp,
        right: Operand,
    },
    /// A recursive AND/OR group.
    Group {
        op: BoolOp,
        children: Vec<Condition>,
    },
}

impl Condition {
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    pub fn cmp(left: impl Into<ColumnRef>, op: CmpOp, right: impl Into<Operand>) -> Self {
        Self::Cmp {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    /// Comparison with the operator given in its SQL spelling (`">="`, `"like"`, ...).
    pub fn parse_cmp(
        left: impl Into<ColumnRef>,
        op: &str,
        right: impl Into<Operand>,
    ) -> ModelResult<Self> {
        Ok(Self::cmp(left, op.parse()?, right))
    }

    pub fn and(children: Vec<Condition>) -> Self {
        Self::Group {
            op: BoolOp::And,
            children,
        }
    }

    pub fn or(children: Vec<Condition>) -> Self {
        Self::Group {
            op: BoolOp::Or,
            children,
        }
    }
}

/// The schemas visible to one statement: the base table plus any joins.
///
/// Unqualified column references resolve against the base table; qualified
/// references match either a table name or its alias.
#[derive(Debug, Clone)]
pub struct SchemaSet<'a> {
    base: &'a TableSchema,
    joined: Vec<&'a TableSchema>,
}

impl<'a> SchemaSet<'a> {
    pub fn new(base: &'a TableSchema) -> Self {
        Self {
            base,
            joined: Vec::new(),
        }
    }

    pub fn join(&mut self, schema: &'a TableSchema) {
        self.joined.push(schema);
    }

    pub fn base(&self) -> &'a TableSchema {
        self.base
    }

    pub(crate) fn resolve(&self, r: &ColumnRef) -> ModelResult<(&'a TableSchema, &'a Column)> {
        let schema = match &r.table {
            None => self.base,
            Some(t) => std::iter::once(self.base)
                .chain(self.joined.iter().copied())
                .find(|s| s.alias() == t || s.name() == t)
                .ok_or_else(|| {
                    ModelError::config(format!("unknown table '{}' in column reference", t))
                })?,
        };
        let column = schema.require_column(&r.column)?;
        Ok((schema, column))
    }
}

/// Per-type operator legality.
fn allowed(ty: LogicalType, op: CmpOp) -> bool {
    use CmpOp::*;
    match ty {
        LogicalType::Array(_) => matches!(op, Eq | Any | Contains | Overlaps),
        LogicalType::Scalar(scalar) => match scalar {
            ScalarType::Number
            | ScalarType::Date
            | ScalarType::Time
            | ScalarType::Timestamp => matches!(op, Eq | Ne | Gt | Gte | Lt | Lte | In | NotIn),
            ScalarType::Text => matches!(
                op,
                Eq | Ne | Like | Ilike | H2fLike | H2fIlike | In | NotIn
            ),
            ScalarType::Uuid => matches!(op, Eq | Ne | In | NotIn),
            ScalarType::Bool => matches!(op, Eq | Ne),
        },
    }
}

/// Compile a condition tree into a fragment.
///
/// `offset` is the number of parameters the statement has already emitted; the
/// fragment's placeholders start at `$offset+1` and its `params` hold only the
/// parameters this tree contributes. An all-empty tree (e.g. `IN []`) yields
/// [`Fragment::empty`].
pub fn compile(cond: &Condition, schemas: &SchemaSet<'_>, offset: usize) -> ModelResult<Fragment> {
    match cond {
        Condition::Raw(sql) => Ok(Fragment::raw(sql.clone())),
        Condition::Group { op, children } => {
            let mut params = ParamList::new();
            let mut parts = Vec::new();
            for child in children {
                let frag = compile(child, schemas, offset + params.len())?;
                if frag.is_empty() {
                    continue;
                }
                parts.push(format!("({})", frag.text));
                params.extend(frag.params);
            }
            if parts.is_empty() {
                return Ok(Fragment::empty());
            }
            Ok(Fragment::new(
                format!("({})", parts.join(op.joiner())),
                params,
            ))
        }
        Condition::Cmp { left, op, right } => compile_cmp(left, *op, right, schemas, offset),
    }
}

fn compile_cmp(
    left: &ColumnRef,
    op: CmpOp,
    right: &Operand,
    schemas: &SchemaSet<'_>,
    offset: usize,
) -> ModelResult<Fragment> {
    let (lschema, lcol) = schemas.resolve(left)?;
    let lty = lcol.logical_type;
    if !allowed(lty, op) {
        return Err(ModelError::config(format!(
            "operator '{}' is not allowed for type '{}' (column '{}.{}')",
            op.sql(),
            lty.name(),
            lschema.name(),
            lcol.name
        )));
    }
    let lhs = lschema.qualify(&lcol.name);

    match right {
        Operand::Null => compile_null(&lhs, op, lschema.name(), lcol),
        Operand::Column(rref) => compile_column_rhs(&lhs, op, lty, lschema, lcol, rref, schemas),
        Operand::Value(value) => compile_value_rhs(&lhs, op, lty, lschema, lcol, value, offset),
    }
}

fn compile_null(lhs: &str, op: CmpOp, table: &str, lcol: &Column) -> ModelResult<Fragment> {
    let keyword = match op {
        CmpOp::Eq => "is null",
        CmpOp::Ne => "is not null",
        _ => {
            return Err(ModelError::config(format!(
                "only = and != may compare column '{}.{}' against NULL",
                table, lcol.name
            )));
        }
    };
    if !lcol.is_nullable() {
        return Err(ModelError::config(format!(
            "column '{}.{}' is not nullable and cannot be compared against NULL",
            table, lcol.name
        )));
    }
    Ok(Fragment::raw(format!("{lhs} {keyword}")))
}

fn compile_column_rhs(
    lhs: &str,
    op: CmpOp,
    lty: LogicalType,
    lschema: &TableSchema,
    lcol: &Column,
    rref: &ColumnRef,
    schemas: &SchemaSet<'_>,
) -> ModelResult<Fragment> {
    let (rschema, rcol) = schemas.resolve(rref)?;
    if rcol.logical_type != lty {
        return Err(ModelError::config(format!(
            "type mismatch comparing '{}.{}' ({}) with '{}.{}' ({})",
            lschema.name(),
            lcol.name,
            lty.name(),
            rschema.name(),
            rcol.name,
            rcol.logical_type.name()
        )));
    }
    let rhs = rschema.qualify(&rcol.name);
    match op {
        CmpOp::Eq if lty.is_array() => {
            // Set semantics, same as the value form.
            Ok(Fragment::raw(format!("({lhs} @> {rhs} AND {rhs} @> {lhs})")))
        }
        CmpOp::Eq | CmpOp::Ne | CmpOp::Gt | CmpOp::Gte | CmpOp::Lt | CmpOp::Lte => {
            Ok(Fragment::raw(format!("{lhs} {} {rhs}", op.sql())))
        }
        CmpOp::Contains | CmpOp::Overlaps => {
            Ok(Fragment::raw(format!("{lhs} {} {rhs}", op.sql())))
        }
        _ => Err(ModelError::config(format!(
            "operator '{}' requires a value, not a column reference",
            op.sql()
        ))),
    }
}

fn compile_value_rhs(
    lhs: &str,
    op: CmpOp,
    lty: LogicalType,
    lschema: &TableSchema,
    lcol: &Column,
    value: &Value,
    offset: usize,
) -> ModelResult<Fragment> {
    let mut params = ParamList::new();
    let invalid = |v: &Value| {
        ModelError::config(format!(
            "value {:?} is not acceptable for type '{}' (column '{}.{}')",
            v,
            lty.name(),
            lschema.name(),
            lcol.name
        ))
    };

    let text = match op {
        CmpOp::In | CmpOp::NotIn => {
            let items = value.as_array().ok_or_else(|| {
                ModelError::config(format!(
                    "operator '{}' requires a non-scalar array value",
                    op.sql()
                ))
            })?;
            // Empty list means "no filter": contribute nothing to the statement.
            if items.is_empty() {
                return Ok(Fragment::empty());
            }
            let element = LogicalType::Scalar(lty.element());
            for item in items {
                if !validate::accepts(&element, item) {
                    return Err(invalid(item));
                }
            }
            let idx = offset + params.push(value.clone());
            let cmp = if op == CmpOp::In { "=" } else { "!=" };
            format!("{lhs} {cmp} ANY(${idx})")
        }
        CmpOp::Eq if lty.is_array() => {
            if !validate::accepts(&lty, value) {
                return Err(invalid(value));
            }
            // Plain array = is ordinal; bidirectional containment gives the
            // intended "same members, any order" semantics.
            let idx = offset + params.push(value.clone());
            format!("({lhs} @> ${idx} AND ${idx} @> {lhs})")
        }
        CmpOp::Any => {
            let element = LogicalType::Scalar(lty.element());
            if !validate::accepts(&element, value) {
                return Err(invalid(value));
            }
            let idx = offset + params.push(value.clone());
            format!("${idx} = ANY({lhs})")
        }
        CmpOp::Contains | CmpOp::Overlaps => {
            if !validate::accepts(&lty, value) {
                return Err(invalid(value));
            }
            let idx = offset + params.push(value.clone());
            format!("{lhs} {} ${idx}", op.sql())
        }
        CmpOp::Like | CmpOp::Ilike => {
            let s = value.as_text().ok_or_else(|| invalid(value))?;
            let idx = offset + params.push(Value::Text(format!("%{s}%")));
            format!("{lhs} {} ${idx}", op.sql())
        }
        CmpOp::H2fLike | CmpOp::H2fIlike => {
            let s = value.as_text().ok_or_else(|| invalid(value))?;
            let idx = offset + params.push(Value::Text(format!("%{s}%")));
            format!(
                "{} {} {}",
                translate_chain(lhs),
                op.sql(),
                translate_chain(&format!("${idx}"))
            )
        }
        CmpOp::Eq | CmpOp::Ne | CmpOp::Gt | CmpOp::Gte | CmpOp::Lt | CmpOp::Lte => {
            if !validate::accepts(&lty, value) {
                return Err(invalid(value));
            }
            let idx = offset + params.push(value.clone());
            format!("{lhs} {} ${idx}", op.sql())
        }
    };

    Ok(Fragment::new(text, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, TableSchema};

    fn users() -> TableSchema {
        TableSchema::builder("users")
            .column(Column::new("id", LogicalType::Scalar(ScalarType::Uuid)).primary())
            .column(Column::new("age", LogicalType::Scalar(ScalarType::Number)))
            .column(Column::new("name", LogicalType::Scalar(ScalarType::Text)).length(50))
            .column(Column::new("deleted_at", LogicalType::Scalar(ScalarType::Timestamp)).nullable())
            .column(Column::new("active", LogicalType::Scalar(ScalarType::Bool)))
            .column(Column::new("scores", LogicalType::Array(ScalarType::Number)))
            .finish()
            .unwrap()
    }

    fn orders() -> TableSchema {
        TableSchema::builder("orders")
            .alias("o")
            .column(Column::new("id", LogicalType::Scalar(ScalarType::Uuid)).primary())
            .column(Column::new("user_id", LogicalType::Scalar(ScalarType::Uuid)))
            .column(Column::new("total", LogicalType::Scalar(ScalarType::Number)))
            .finish()
            .unwrap()
    }

    fn compile_one(cond: Condition) -> ModelResult<Fragment> {
        let schema = users();
        let set = SchemaSet::new(&schema);
        compile(&cond, &set, 0)
    }

    #[test]
    fn and_group_of_range_and_like() {
        let cond = Condition::and(vec![
            Condition::cmp("age", CmpOp::Gte, 18i64),
            Condition::cmp("name", CmpOp::Like, "Jo"),
        ]);
        let frag = compile_one(cond).unwrap();
        assert_eq!(
            frag.text,
            "((\"users\".\"age\" >= $1) AND (\"users\".\"name\" like $2))"
        );
        assert_eq!(
            frag.params.values(),
            &[Value::Number(18.0), Value::Text("%Jo%".into())]
        );
    }

    #[test]
    fn placeholders_are_sequential_under_nesting() {
        // Depth-3 tree with mixed branching; placeholders must be 1..N in
        // left-to-right emission order.
        let cond = Condition::and(vec![
            Condition::cmp("age", CmpOp::Gte, 18i64),
            Condition::or(vec![
                Condition::cmp("name", CmpOp::Like, "a"),
                Condition::and(vec![
                    Condition::cmp("age", CmpOp::Lt, 65i64),
                    Condition::cmp("active", CmpOp::Eq, true),
                ]),
            ]),
            Condition::cmp("age", CmpOp::Ne, 40i64),
        ]);
        let frag = compile_one(cond).unwrap();
        for n in 1..=5 {
            assert!(frag.text.contains(&format!("${n}")), "missing ${n} in {}", frag.text);
        }
        assert!(!frag.text.contains("$6"));
        assert_eq!(frag.params.len(), 5);
        // Left-to-right ordering.
        let positions: Vec<usize> = (1..=5)
            .map(|n| frag.text.find(&format!("${n}")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn offset_shifts_placeholders() {
        let frag = {
            let schema = users();
            let set = SchemaSet::new(&schema);
            compile(&Condition::cmp("age", CmpOp::Eq, 30i64), &set, 7).unwrap()
        };
        assert_eq!(frag.text, "\"users\".\"age\" = $8");
        assert_eq!(frag.params.len(), 1);
    }

    #[test]
    fn operator_legality_per_type() {
        // uuid allows only equality-class operators.
        assert!(compile_one(Condition::cmp("id", CmpOp::Gt, "x")).unwrap_err().is_config());
        // bool allows only =/!=.
        assert!(compile_one(Condition::cmp("active", CmpOp::Like, "t")).unwrap_err().is_config());
        // number rejects like.
        assert!(compile_one(Condition::cmp("age", CmpOp::Like, "1")).unwrap_err().is_config());
        // array rejects plain >.
        assert!(
            compile_one(Condition::cmp("scores", CmpOp::Gt, Value::Array(vec![])))
                .unwrap_err()
                .is_config()
        );
        // Legal pairs succeed.
        assert!(compile_one(Condition::cmp("age", CmpOp::Lte, 10i64)).is_ok());
        assert!(compile_one(Condition::cmp("active", CmpOp::Eq, true)).is_ok());
    }

    #[test]
    fn invalid_value_for_type_is_config_error() {
        let err = compile_one(Condition::cmp("age", CmpOp::Eq, "abc")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn null_rewrites_to_is_null() {
        let frag = compile_one(Condition::cmp("deleted_at", CmpOp::Eq, Operand::Null)).unwrap();
        assert_eq!(frag.text, "\"users\".\"deleted_at\" is null");
        assert!(frag.params.is_empty());

        let frag = compile_one(Condition::cmp("deleted_at", CmpOp::Ne, Operand::Null)).unwrap();
        assert_eq!(frag.text, "\"users\".\"deleted_at\" is not null");
    }

    #[test]
    fn null_on_non_nullable_column_raises() {
        let err = compile_one(Condition::cmp("age", CmpOp::Eq, Operand::Null)).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn null_with_ordering_operator_raises() {
        let err = compile_one(Condition::cmp("deleted_at", CmpOp::Gt, Operand::Null)).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn in_binds_whole_array_as_one_parameter() {
        let values = Value::Array(vec![Value::from(1i64), Value::from(2i64), Value::from(3i64)]);
        let frag = compile_one(Condition::cmp("age", CmpOp::In, values)).unwrap();
        assert_eq!(frag.text, "\"users\".\"age\" = ANY($1)");
        assert_eq!(frag.params.len(), 1);

        let values = Value::Array(vec![Value::from(1i64)]);
        let frag = compile_one(Condition::cmp("age", CmpOp::NotIn, values)).unwrap();
        assert_eq!(frag.text, "\"users\".\"age\" != ANY($1)");
    }

    #[test]
    fn empty_in_list_is_no_filter() {
        let frag = compile_one(Condition::cmp("age", CmpOp::In, Value::Array(vec![]))).unwrap();
        assert!(frag.is_empty());
        assert!(frag.params.is_empty());
    }

    #[test]
    fn group_skips_empty_children() {
        let cond = Condition::and(vec![
            Condition::cmp("age", CmpOp::In, Value::Array(vec![])),
            Condition::cmp("age", CmpOp::Gte, 18i64),
        ]);
        let frag = compile_one(cond).unwrap();
        assert_eq!(frag.text, "((\"users\".\"age\" >= $1))");
        assert_eq!(frag.params.len(), 1);
    }

    #[test]
    fn all_empty_group_is_empty() {
        let cond = Condition::or(vec![
            Condition::cmp("age", CmpOp::In, Value::Array(vec![])),
            Condition::cmp("age", CmpOp::NotIn, Value::Array(vec![])),
        ]);
        assert!(compile_one(cond).unwrap().is_empty());
    }

    #[test]
    fn in_element_validated_against_column_type() {
        let values = Value::Array(vec![Value::from(1i64), Value::from("x")]);
        assert!(compile_one(Condition::cmp("age", CmpOp::In, values)).unwrap_err().is_config());
    }

    #[test]
    fn array_equality_uses_set_semantics() {
        let values = Value::Array(vec![Value::from(1i64), Value::from(2i64), Value::from(3i64)]);
        let frag = compile_one(Condition::cmp("scores", CmpOp::Eq, values)).unwrap();
        assert_eq!(
            frag.text,
            "(\"users\".\"scores\" @> $1 AND $1 @> \"users\".\"scores\")"
        );
        // One bound array, referenced twice.
        assert_eq!(frag.params.len(), 1);
    }

    #[test]
    fn array_equality_ignores_duplicate_counts() {
        // Bidirectional containment treats [1,1,2] and [1,2] as equal. This is
        // intended behavior carried over from the source system, not a bug.
        let frag =
            compile_one(Condition::cmp("scores", CmpOp::Eq, Value::Array(vec![
                Value::from(1i64),
                Value::from(1i64),
                Value::from(2i64),
            ])))
            .unwrap();
        assert!(frag.text.contains("@>"));
        assert!(!frag.text.contains(" = $"));
    }

    #[test]
    fn any_puts_scalar_on_the_left() {
        let frag = compile_one(Condition::cmp("scores", CmpOp::Any, 5i64)).unwrap();
        assert_eq!(frag.text, "$1 = ANY(\"users\".\"scores\")");
    }

    #[test]
    fn contains_and_overlap_bind_arrays() {
        let arr = Value::Array(vec![Value::from(1i64)]);
        let frag = compile_one(Condition::cmp("scores", CmpOp::Contains, arr.clone())).unwrap();
        assert_eq!(frag.text, "\"users\".\"scores\" @> $1");
        let frag = compile_one(Condition::cmp("scores", CmpOp::Overlaps, arr)).unwrap();
        assert_eq!(frag.text, "\"users\".\"scores\" && $1");
    }

    #[test]
    fn like_wraps_value_in_wildcards() {
        let frag = compile_one(Condition::cmp("name", CmpOp::Ilike, "jo")).unwrap();
        assert_eq!(frag.text, "\"users\".\"name\" ilike $1");
        assert_eq!(frag.params.values(), &[Value::Text("%jo%".into())]);
    }

    #[test]
    fn h2f_like_wraps_both_sides_in_translate_chain() {
        let frag = compile_one(Condition::cmp("name", CmpOp::H2fLike, "ｱ")).unwrap();
        // Both the column and the placeholder are canonicalized.
        assert_eq!(frag.text.matches("TRANSLATE(").count(), 6);
        assert!(frag.text.contains(" like "));
        assert_eq!(frag.params.values(), &[Value::Text("%ｱ%".into())]);
        // Deterministic: compiling twice yields identical SQL.
        let again = compile_one(Condition::cmp("name", CmpOp::H2fLike, "ｱ")).unwrap();
        assert_eq!(frag.text, again.text);
    }

    #[test]
    fn column_vs_column_requires_identical_types() {
        let schema = users();
        let other = orders();
        let mut set = SchemaSet::new(&schema);
        set.join(&other);

        let ok = compile(
            &Condition::cmp("id", CmpOp::Eq, Operand::Column(ColumnRef::on("o", "user_id"))),
            &set,
            0,
        )
        .unwrap();
        assert_eq!(ok.text, "\"users\".\"id\" = \"o\".\"user_id\"");
        assert!(ok.params.is_empty());

        let err = compile(
            &Condition::cmp("age", CmpOp::Eq, Operand::Column(ColumnRef::on("o", "id"))),
            &set,
            0,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("users") && msg.contains("orders"), "{msg}");
    }

    #[test]
    fn qualified_reference_resolves_by_alias() {
        let schema = users();
        let other = orders();
        let mut set = SchemaSet::new(&schema);
        set.join(&other);
        let frag = compile(&Condition::cmp(ColumnRef::on("o", "total"), CmpOp::Gt, 5i64), &set, 0)
            .unwrap();
        assert_eq!(frag.text, "\"o\".\"total\" > $1");
    }

    #[test]
    fn raw_passes_through_verbatim() {
        let frag = compile_one(Condition::raw("1 = 1")).unwrap();
        assert_eq!(frag.text, "1 = 1");
        assert!(frag.params.is_empty());
    }

    #[test]
    fn unknown_column_raises() {
        assert!(compile_one(Condition::cmp("missing", CmpOp::Eq, 1i64)).unwrap_err().is_config());
    }

    #[test]
    fn operator_parsing() {
        assert_eq!("not in".parse::<CmpOp>().unwrap(), CmpOp::NotIn);
        assert_eq!("@>".parse::<CmpOp>().unwrap(), CmpOp::Contains);
        assert!("~".parse::<CmpOp>().is_err());
    }
}
