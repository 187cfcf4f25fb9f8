//! Binding composed values onto `sqlx` queries
//!
//! Composers return values as `serde_json::Value`. Update values are bound
//! with the PostgreSQL type of their target column so that NULLs and numeric
//! strings land correctly; filter values are bound by their JSON type.

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::Postgres;
use sqlx::postgres::PgArguments;

use crate::error::{Result, StoreError};
use crate::types::{ColumnType, TableDefinition, coerce_bool, coerce_decimal, coerce_i32};

pub type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// Bind `value` as the PostgreSQL type of `column_type`.
pub fn bind_value<'q>(
    query: PgQuery<'q>,
    column_type: &ColumnType,
    column_name: &str,
    value: &Value,
) -> Result<PgQuery<'q>> {
    let invalid = |e: String| {
        StoreError::validation(format!("Invalid value for column '{}': {}", column_name, e))
    };

    Ok(match column_type {
        ColumnType::Text => {
            if value.is_null() {
                query.bind(None::<String>)
            } else {
                let text = value.as_str().ok_or_else(|| {
                    StoreError::validation(format!("Column '{}' expected string", column_name))
                })?;
                query.bind(text.to_string())
            }
        }
        ColumnType::Integer | ColumnType::Serial => {
            if value.is_null() {
                query.bind(None::<i32>)
            } else {
                query.bind(coerce_i32(value).map_err(invalid)?)
            }
        }
        ColumnType::Decimal { .. } => {
            if value.is_null() {
                query.bind(None::<Decimal>)
            } else {
                query.bind(coerce_decimal(value).map_err(invalid)?)
            }
        }
        ColumnType::Boolean => {
            if value.is_null() {
                query.bind(None::<bool>)
            } else {
                query.bind(coerce_bool(value).map_err(invalid)?)
            }
        }
    })
}

/// Bind `columns[i]`/`values[i]` pairs using `table`'s column types.
pub fn bind_columns<'q>(
    mut query: PgQuery<'q>,
    table: &TableDefinition,
    columns: &[String],
    values: &[Value],
) -> Result<PgQuery<'q>> {
    for (column, value) in columns.iter().zip(values) {
        let definition = table.column(column).ok_or_else(|| {
            StoreError::validation(format!("Unknown column '{}' on {}", column, table.name))
        })?;
        query = bind_value(query, &definition.column_type, column, value)?;
    }
    Ok(query)
}

/// Bind a filter value by its JSON type.
pub fn bind_json<'q>(query: PgQuery<'q>, value: &Value) -> PgQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.clone()),
    }
}

/// Bind every value of a composed clause in order.
pub fn bind_all<'q>(query: PgQuery<'q>, values: &[Value]) -> PgQuery<'q> {
    values.iter().fold(query, bind_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnDefinition;
    use serde_json::json;

    fn jobs_table() -> TableDefinition {
        TableDefinition::new(
            "jobs",
            vec![
                ColumnDefinition::new("title", ColumnType::Text).not_null(),
                ColumnDefinition::new("salary", ColumnType::Integer),
                ColumnDefinition::new("equity", ColumnType::decimal(4, 3)),
            ],
        )
    }

    // Building a query does not touch the database, so binding can be
    // exercised without a connection.

    #[test]
    fn test_bind_typed_values() {
        let table = jobs_table();
        let columns = vec!["title".to_string(), "salary".to_string(), "equity".to_string()];
        let values = vec![json!("Engineer"), json!("120000"), json!("0.05")];

        let query = sqlx::query("UPDATE jobs SET title=$1, salary=$2, equity=$3");
        assert!(bind_columns(query, &table, &columns, &values).is_ok());
    }

    #[test]
    fn test_bind_nulls() {
        let table = jobs_table();
        let columns = vec!["salary".to_string(), "equity".to_string()];
        let values = vec![Value::Null, Value::Null];

        let query = sqlx::query("UPDATE jobs SET salary=$1, equity=$2");
        assert!(bind_columns(query, &table, &columns, &values).is_ok());
    }

    #[test]
    fn test_bind_rejects_mistyped_value() {
        let query = sqlx::query("UPDATE jobs SET salary=$1");
        let Err(err) = bind_value(query, &ColumnType::Integer, "salary", &json!("lots")) else {
            panic!("expected a non-numeric salary to be rejected");
        };
        assert!(err.to_string().contains("salary"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_bind_rejects_unknown_column() {
        let table = jobs_table();
        let query = sqlx::query("UPDATE jobs SET nope=$1");
        let Err(err) = bind_columns(query, &table, &["nope".to_string()], &[json!(1)]) else {
            panic!("expected an unknown column to be rejected");
        };
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
