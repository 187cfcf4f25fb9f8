//! Core type definitions for the store
//!
//! Includes column types, column definitions and table definitions used to
//! create the resource tables and to bind update values with the right
//! PostgreSQL type.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Column Types
// ============================================================================

/// Column type definition with validation and SQL mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnType {
    /// Text field (maps to TEXT)
    Text,

    /// 32-bit integer field (maps to INTEGER)
    Integer,

    /// Auto-incrementing integer key (maps to SERIAL)
    Serial,

    /// Decimal field with precision and scale (maps to NUMERIC)
    Decimal {
        /// Total number of digits
        precision: u8,
        /// Number of digits after decimal point
        scale: u8,
    },

    /// Boolean field (maps to BOOLEAN)
    Boolean,
}

impl ColumnType {
    /// Create a Decimal type with specified precision and scale
    pub fn decimal(precision: u8, scale: u8) -> Self {
        ColumnType::Decimal { precision, scale }
    }

    /// Convert column type to PostgreSQL type string
    pub fn to_sql_type(&self) -> String {
        match self {
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Serial => "SERIAL".to_string(),
            ColumnType::Decimal { precision, scale } => {
                format!("NUMERIC({},{})", precision, scale)
            }
            ColumnType::Boolean => "BOOLEAN".to_string(),
        }
    }
}

/// Read an INTEGER value, allowing numeric strings.
pub fn coerce_i32(value: &Value) -> Result<i32, String> {
    let wide = value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
        .ok_or_else(|| format!("Cannot convert {} to integer", value))?;
    i32::try_from(wide).map_err(|_| format!("Integer {} is out of range", wide))
}

/// Read a NUMERIC value from a JSON number or numeric string.
pub fn coerce_decimal(value: &Value) -> Result<Decimal, String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(format!("Cannot convert {} to decimal", value)),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| format!("Cannot convert '{}' to decimal", text))
}

/// Read a BOOLEAN value, allowing the usual string spellings.
pub fn coerce_bool(value: &Value) -> Result<bool, String> {
    value
        .as_bool()
        .or_else(|| {
            value
                .as_str()
                .and_then(|s| match s.to_lowercase().as_str() {
                    "true" | "1" | "yes" => Some(true),
                    "false" | "0" | "no" => Some(false),
                    _ => None,
                })
        })
        .ok_or_else(|| format!("Cannot convert {} to boolean", value))
}

// ============================================================================
// Column and Table Definitions
// ============================================================================

/// Foreign key target of a column
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    /// Delete dependent rows together with the referenced row
    pub cascade: bool,
}

/// Column definition for a resource table
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    pub column_type: ColumnType,
    /// Whether the column allows NULL values (default: true)
    pub nullable: bool,
    /// Whether the column has a UNIQUE constraint (default: false)
    pub unique: bool,
    /// Whether this column alone is the primary key
    pub primary_key: bool,
    /// Default value (SQL expression, e.g., "FALSE")
    pub default_value: Option<String>,
    /// CHECK constraint expression
    pub check: Option<String>,
    pub references: Option<ForeignKey>,
}

impl ColumnDefinition {
    /// Create a new column definition with a name and type
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            unique: false,
            primary_key: false,
            default_value: None,
            check: None,
            references: None,
        }
    }

    /// Set the column as non-nullable
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the column as unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Make the column the table's primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Set a default value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Add a CHECK constraint
    pub fn check(mut self, expression: impl Into<String>) -> Self {
        self.check = Some(expression.into());
        self
    }

    /// Reference another table's column, deleting this row with it
    pub fn references_cascade(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
            cascade: true,
        });
        self
    }
}

/// A resource table
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    /// Composite primary key, when no single column is marked as one
    pub primary_key: Vec<String>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key: Vec::new(),
        }
    }

    /// Set a composite primary key
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }
}
