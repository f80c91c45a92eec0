//! UPDATE SET-clause compilation.

use crate::error::{Locale, ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::schema::{ColumnAttr, TableSchema, quote_ident};
use crate::validate;
use crate::value::{ParamList, Value};

/// Compile `set "col1" = $1, "col2" = $2, ...` from a list of column changes.
///
/// Primary-key columns are immutable post-insert; naming one is a
/// configuration error, as is naming an unknown column. Every value is
/// validated against its column (type, NULL legality, length), raising domain
/// errors. Placeholders start at `$offset+1`.
pub fn compile_set(
    schema: &TableSchema,
    changes: &[(String, Value)],
    offset: usize,
    locale: Locale,
) -> ModelResult<Fragment> {
    if changes.is_empty() {
        return Err(ModelError::config(format!(
            "update on table '{}' has no SET columns",
            schema.name()
        )));
    }
    let mut params = ParamList::new();
    let mut assignments = Vec::with_capacity(changes.len());
    for (name, value) in changes {
        let column = schema.require_column(name)?;
        if column.attr == ColumnAttr::Primary {
            return Err(ModelError::config(format!(
                "primary-key column '{}' on table '{}' cannot be updated",
                name,
                schema.name()
            )));
        }
        validate::check_column(column, value, locale)?;
        let idx = offset + params.push(value.clone());
        assignments.push(format!("{} = ${idx}", quote_ident(name)));
    }
    Ok(Fragment::new(
        format!("set {}", assignments.join(", ")),
        params,
    ))
}
