//! DDL generation for the resource tables

use crate::sql::sanitize::quote_identifier;
use crate::types::{ColumnDefinition, TableDefinition};

/// DDL generator for resource tables
pub struct DdlGenerator;

impl DdlGenerator {
    /// Generate an idempotent CREATE TABLE statement
    pub fn generate_create_table(table: &TableDefinition) -> String {
        let mut parts: Vec<String> = table
            .columns
            .iter()
            .map(Self::format_column_definition)
            .collect();

        if !table.primary_key.is_empty() {
            let keys: Vec<String> = table
                .primary_key
                .iter()
                .map(|c| quote_identifier(c))
                .collect();
            parts.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(&table.name),
            parts.join(", ")
        )
    }

    /// Format a single column definition for CREATE TABLE
    pub fn format_column_definition(col: &ColumnDefinition) -> String {
        let mut parts = vec![quote_identifier(&col.name), col.column_type.to_sql_type()];

        if col.primary_key {
            parts.push("PRIMARY KEY".to_string());
        }

        if col.unique {
            parts.push("UNIQUE".to_string());
        }

        // PRIMARY KEY already implies NOT NULL
        if !col.nullable && !col.primary_key {
            parts.push("NOT NULL".to_string());
        }

        if let Some(default) = &col.default_value {
            parts.push(format!("DEFAULT {}", default));
        }

        if let Some(check) = &col.check {
            parts.push(format!("CHECK ({})", check));
        }

        if let Some(fk) = &col.references {
            parts.push(format!(
                "REFERENCES {}({})",
                quote_identifier(&fk.table),
                quote_identifier(&fk.column)
            ));
            if fk.cascade {
                parts.push("ON DELETE CASCADE".to_string());
            }
        }

        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;

    // ==================== Column Formatting ====================

    #[test]
    fn test_format_plain_column() {
        let col = ColumnDefinition::new("logo_url", ColumnType::Text);
        assert_eq!(
            DdlGenerator::format_column_definition(&col),
            "\"logo_url\" TEXT"
        );
    }

    #[test]
    fn test_format_primary_key_column() {
        let col = ColumnDefinition::new("id", ColumnType::Serial).primary_key();
        assert_eq!(
            DdlGenerator::format_column_definition(&col),
            "\"id\" SERIAL PRIMARY KEY"
        );
    }

    #[test]
    fn test_format_constrained_column() {
        let col = ColumnDefinition::new("name", ColumnType::Text)
            .unique()
            .not_null();
        assert_eq!(
            DdlGenerator::format_column_definition(&col),
            "\"name\" TEXT UNIQUE NOT NULL"
        );
    }

    #[test]
    fn test_format_default_and_check() {
        let col = ColumnDefinition::new("is_admin", ColumnType::Boolean)
            .not_null()
            .default("FALSE");
        assert_eq!(
            DdlGenerator::format_column_definition(&col),
            "\"is_admin\" BOOLEAN NOT NULL DEFAULT FALSE"
        );

        let col = ColumnDefinition::new("equity", ColumnType::decimal(4, 3)).check("equity <= 1.0");
        assert_eq!(
            DdlGenerator::format_column_definition(&col),
            "\"equity\" NUMERIC(4,3) CHECK (equity <= 1.0)"
        );
    }

    #[test]
    fn test_format_foreign_key() {
        let col = ColumnDefinition::new("company_handle", ColumnType::Text)
            .not_null()
            .references_cascade("companies", "handle");
        assert_eq!(
            DdlGenerator::format_column_definition(&col),
            "\"company_handle\" TEXT NOT NULL REFERENCES \"companies\"(\"handle\") ON DELETE CASCADE"
        );
    }

    // ==================== Tables ====================

    #[test]
    fn test_create_table_with_composite_key() {
        let table = TableDefinition::new(
            "applications",
            vec![
                ColumnDefinition::new("username", ColumnType::Text).not_null(),
                ColumnDefinition::new("job_id", ColumnType::Integer).not_null(),
            ],
        )
        .with_primary_key(&["username", "job_id"]);

        assert_eq!(
            DdlGenerator::generate_create_table(&table),
            "CREATE TABLE IF NOT EXISTS \"applications\" (\"username\" TEXT NOT NULL, \"job_id\" INTEGER NOT NULL, PRIMARY KEY (\"username\", \"job_id\"))"
        );
    }
}
