//! SQL identifier quoting
//!
//! Column identifiers are the only non-placeholder text composed clauses
//! contain, so every one of them goes through [`quote_identifier`].

/// Quote a SQL identifier to make it safe for use in queries
///
/// Embedded double quotes are doubled, so the result is always a single
/// delimited identifier.
///
/// # Example
/// ```
/// use jobly_store::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("first_name"), "\"first_name\"");
/// assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}
