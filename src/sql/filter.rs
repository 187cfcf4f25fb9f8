//! Filter composition for search queries
//!
//! A resource declares which filter keys it understands as a table of
//! [`Predicate`] entries. [`build_where_clause`] walks that table in declared
//! order and emits one AND-joined comparison per entry whose raw value is
//! usable. Values that are missing, empty or unparseable are dropped without
//! error: search filters are advisory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::sql::params::ParamAllocator;
use crate::sql::sanitize::quote_identifier;

/// How a filter value is compared against its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    /// Case-insensitive containment: `"col" ILIKE '%value%'`
    Contains,
    /// Integer lower bound: `"col" >= value`
    AtLeast,
    /// Integer upper bound: `"col" <= value`
    AtMost,
    /// Boolean filter expressed as a numeric lower bound on the column.
    ///
    /// Only a `true` value triggers it, binding `threshold` rather than the
    /// flag itself.
    Flag { threshold: i64 },
}

impl PredicateKind {
    /// SQL comparison operator for this kind
    pub fn operator(&self) -> &'static str {
        match self {
            PredicateKind::Contains => "ILIKE",
            PredicateKind::AtLeast | PredicateKind::Flag { .. } => ">=",
            PredicateKind::AtMost => "<=",
        }
    }

    /// Value to bind for `raw`, or `None` when the predicate does not apply.
    pub fn bind_value(&self, raw: &Value) -> Option<Value> {
        match self {
            PredicateKind::Contains => {
                let text = match raw {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                if text.is_empty() {
                    None
                } else {
                    Some(Value::String(format!("%{}%", text)))
                }
            }
            PredicateKind::AtLeast | PredicateKind::AtMost => parse_integer(raw).map(Value::from),
            PredicateKind::Flag { threshold } => match parse_flag(raw) {
                Some(true) => Some(Value::from(*threshold)),
                _ => None,
            },
        }
    }
}

/// Parse a filter value as an `i64`; query strings arrive as text.
pub(crate) fn parse_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse a filter value as a typed boolean (`true`/`false` only).
pub(crate) fn parse_flag(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse::<bool>().ok(),
        _ => None,
    }
}

/// One recognized filter key and the column it constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate {
    pub key: &'static str,
    pub kind: PredicateKind,
    pub column: &'static str,
}

impl Predicate {
    pub const fn new(key: &'static str, kind: PredicateKind, column: &'static str) -> Self {
        Self { key, kind, column }
    }

    pub const fn contains(key: &'static str, column: &'static str) -> Self {
        Self::new(key, PredicateKind::Contains, column)
    }

    pub const fn at_least(key: &'static str, column: &'static str) -> Self {
        Self::new(key, PredicateKind::AtLeast, column)
    }

    pub const fn at_most(key: &'static str, column: &'static str) -> Self {
        Self::new(key, PredicateKind::AtMost, column)
    }

    pub const fn flag(key: &'static str, column: &'static str, threshold: i64) -> Self {
        Self::new(key, PredicateKind::Flag { threshold }, column)
    }
}

/// Loose filter record as supplied by a caller, e.g. parsed query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterCriteria(Map<String, Value>);

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build criteria from string pairs, as decoded from a query string.
    /// A repeated key keeps its last value.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    /// Set a filter value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for FilterCriteria {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Composed `WHERE` condition (without the `WHERE` keyword).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    /// `"<column>" <op> $<n>` fragments in predicate table order
    pub fragments: Vec<String>,
    /// Bound values; `values[i]` binds to `fragments[i]`
    pub values: Vec<Value>,
}

impl WhereClause {
    /// Condition text, fragments joined with ` AND `. Empty when unfiltered.
    pub fn to_sql(&self) -> String {
        self.fragments.join(" AND ")
    }

    /// `WHERE <condition>`, or an empty string when unfiltered.
    pub fn to_where_sql(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.to_sql())
        }
    }

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

/// Build a `WHERE` condition from `criteria` using a resource's predicate table.
///
/// `None` criteria yields an empty clause. Unrecognized keys and unusable
/// values are ignored. The only failure is an empty predicate table, which
/// is a programming error in the calling resource.
///
/// # Example
/// ```
/// use jobly_store::sql::{build_where_clause, FilterCriteria, Predicate};
///
/// const JOB_FILTERS: &[Predicate] = &[
///     Predicate::contains("title", "title"),
///     Predicate::at_least("minSalary", "salary"),
/// ];
///
/// let criteria = FilterCriteria::from_pairs([("title", "job1"), ("minSalary", "1")]);
/// let clause = build_where_clause(Some(&criteria), JOB_FILTERS).unwrap();
///
/// assert_eq!(clause.to_sql(), "\"title\" ILIKE $1 AND \"salary\" >= $2");
/// assert_eq!(clause.values, vec![serde_json::json!("%job1%"), serde_json::json!(1)]);
/// ```
pub fn build_where_clause(
    criteria: Option<&FilterCriteria>,
    predicates: &[Predicate],
) -> Result<WhereClause> {
    let Some(criteria) = criteria else {
        return Ok(WhereClause::default());
    };

    if predicates.is_empty() {
        return Err(StoreError::invalid_filter(
            "no predicate table supplied for filter composition",
        ));
    }

    for key in unrecognized_keys(criteria, predicates) {
        tracing::debug!(key, "ignoring unrecognized filter key");
    }

    let mut params = ParamAllocator::new();
    let mut fragments = Vec::new();

    for predicate in predicates {
        let Some(raw) = criteria.get(predicate.key) else {
            continue;
        };
        let Some(value) = predicate.kind.bind_value(raw) else {
            tracing::trace!(key = predicate.key, "dropping unusable filter value");
            continue;
        };
        let index = params.push(value);
        fragments.push(format!(
            "{} {} ${}",
            quote_identifier(predicate.column),
            predicate.kind.operator(),
            index
        ));
    }

    Ok(WhereClause {
        fragments,
        values: params.into_values(),
    })
}

/// Keys of `criteria` that no entry in `predicates` recognizes.
pub fn unrecognized_keys<'a>(criteria: &'a FilterCriteria, predicates: &[Predicate]) -> Vec<&'a str> {
    criteria
        .keys()
        .filter(|key| !predicates.iter().any(|p| p.key == *key))
        .collect()
}
