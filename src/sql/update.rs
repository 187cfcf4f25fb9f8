//! Partial update composition
//!
//! Turns a sparse record of changed fields into a `SET` clause whose
//! placeholders line up one-to-one with the returned values.

use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::sql::params::ParamAllocator;
use crate::sql::sanitize::quote_identifier;

/// Fields to change, keyed by external field name.
///
/// Iteration follows insertion order (`serde_json` is built with
/// `preserve_order`). Keys are unique: inserting an existing key replaces its
/// value but keeps its original position.
pub type UpdateRequest = Map<String, Value>;

/// Per-resource translation from external field names to column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldNameMap(&'static [(&'static str, &'static str)]);

impl FieldNameMap {
    /// A map that leaves every field name as is.
    pub const IDENTITY: FieldNameMap = FieldNameMap(&[]);

    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self(entries)
    }

    /// Column for `field`, or `field` itself when it has no entry.
    ///
    /// Callers must only pass trusted field names: unmapped names become
    /// column identifiers (quoted, never interpolated raw).
    pub fn column_for<'a>(&self, field: &'a str) -> &'a str {
        self.0
            .iter()
            .find(|(external, _)| *external == field)
            .map(|(_, column)| *column)
            .unwrap_or(field)
    }
}

/// Composed `SET` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    /// Column names in emission order
    pub columns: Vec<String>,
    /// `"<column>"=$<n>` fragments, parallel to `columns`
    pub fragments: Vec<String>,
    /// Bound values; `values[i]` binds to `fragments[i]`
    pub values: Vec<Value>,
}

impl SetClause {
    /// Clause text, fragments joined with `, `.
    pub fn to_sql(&self) -> String {
        self.fragments.join(", ")
    }

    /// Placeholder index for the first fixed value appended after the
    /// dynamic ones, e.g. the row key in a trailing `WHERE`.
    pub fn next_index(&self) -> usize {
        self.values.len() + 1
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Build a `SET` clause from `request`, renaming fields through `fields`.
///
/// Fails with [`StoreError::Validation`] when `request` is empty. Values are
/// passed through untouched, including `null`.
///
/// # Example
/// ```
/// use jobly_store::sql::{build_set_clause, FieldNameMap};
///
/// const FIELDS: FieldNameMap = FieldNameMap::new(&[("firstName", "first_name")]);
///
/// let request = serde_json::json!({"firstName": "Bob", "email": "new@email.com"});
/// let set = build_set_clause(request.as_object().unwrap(), &FIELDS).unwrap();
///
/// assert_eq!(set.to_sql(), "\"first_name\"=$1, \"email\"=$2");
/// assert_eq!(set.values, vec![serde_json::json!("Bob"), serde_json::json!("new@email.com")]);
/// ```
pub fn build_set_clause(request: &UpdateRequest, fields: &FieldNameMap) -> Result<SetClause> {
    if request.is_empty() {
        return Err(StoreError::validation("No data"));
    }

    let mut params = ParamAllocator::new();
    let mut columns = Vec::with_capacity(request.len());
    let mut fragments = Vec::with_capacity(request.len());

    for (field, value) in request {
        let column = fields.column_for(field);
        let index = params.push(value.clone());
        fragments.push(format!("{}=${}", quote_identifier(column), index));
        columns.push(column.to_string());
    }

    Ok(SetClause {
        columns,
        fragments,
        values: params.into_values(),
    })
}

/// Reject a composed update that touches a column outside `allowed` or one
/// of the `immutable` key columns.
pub fn ensure_updatable(set: &SetClause, allowed: &[&str], immutable: &[&str]) -> Result<()> {
    for column in &set.columns {
        if immutable.contains(&column.as_str()) {
            return Err(StoreError::validation(format!(
                "Field '{}' cannot be updated",
                column
            )));
        }
        if !allowed.contains(&column.as_str()) {
            return Err(StoreError::validation(format!("Unknown field '{}'", column)));
        }
    }
    Ok(())
}
