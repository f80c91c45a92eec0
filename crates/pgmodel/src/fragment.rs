//! Compiled SQL fragments.
//!
//! A [`Fragment`] pairs SQL text with the ordered parameters backing its
//! placeholders. The correctness backbone of the whole compiler: once all
//! fragments of one statement are concatenated in emission order (and
//! renumbered accordingly), the `$N` placeholder corresponds exactly to
//! `params[N-1]`.

use crate::value::ParamList;

/// A piece of SQL text plus its bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub params: ParamList,
}

impl Fragment {
    pub fn new(text: impl Into<String>, params: ParamList) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }

    /// A fragment contributing no SQL and no parameters (the "no filter"
    /// short-circuit).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Raw SQL with no parameters.
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: ParamList::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Shift every `$k` placeholder in `sql` by `offset`.
///
/// Used when a locally numbered fragment is spliced into a statement after
/// `offset` parameters have already been emitted.
pub(crate) fn renumber(sql: &str, offset: usize) -> String {
    if offset == 0 {
        return sql.to_string();
    }
    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let mut num = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_ascii_digit() {
                    num.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            result.push('$');
            if let Ok(idx) = num.parse::<usize>() {
                result.push_str(&(idx + offset).to_string());
            } else {
                result.push_str(&num);
            }
        } else {
            result.push(ch);
        }
    }

    result
}
