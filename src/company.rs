//! Company resource
//!
//! Table definition, field names, search filters and statement builders for
//! companies. Statements are returned as text plus values so `store` only
//! has to bind and execute them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::error::{Result, StoreError};
use crate::job::Job;
use crate::sql::filter::parse_integer;
use crate::sql::{
    FieldNameMap, FilterCriteria, Predicate, SetClause, UpdateRequest, build_set_clause,
    build_where_clause, ensure_updatable,
};
use crate::types::{ColumnDefinition, ColumnType, TableDefinition};

pub const TABLE_NAME: &str = "companies";

/// External field names that differ from their column
pub const FIELDS: FieldNameMap =
    FieldNameMap::new(&[("numEmployees", "num_employees"), ("logoUrl", "logo_url")]);

/// Recognized search filters, applied in this order
pub const FILTERS: &[Predicate] = &[
    Predicate::contains("name", "name"),
    Predicate::at_least("minEmployees", "num_employees"),
    Predicate::at_most("maxEmployees", "num_employees"),
];

const UPDATABLE: &[&str] = &["name", "description", "num_employees", "logo_url"];
const IMMUTABLE: &[&str] = &["handle"];

const SELECT_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

pub fn table() -> TableDefinition {
    TableDefinition::new(
        TABLE_NAME,
        vec![
            ColumnDefinition::new("handle", ColumnType::Text)
                .primary_key()
                .check("handle = lower(handle)"),
            ColumnDefinition::new("name", ColumnType::Text)
                .unique()
                .not_null(),
            ColumnDefinition::new("num_employees", ColumnType::Integer).check("num_employees >= 0"),
            ColumnDefinition::new("description", ColumnType::Text).not_null(),
            ColumnDefinition::new("logo_url", ColumnType::Text),
        ],
    )
}

/// A company row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Request to create a company
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl NewCompany {
    pub fn new(
        handle: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            name: name.into(),
            description: description.into(),
            num_employees: None,
            logo_url: None,
        }
    }

    pub fn num_employees(mut self, count: i32) -> Self {
        self.num_employees = Some(count);
        self
    }

    pub fn logo_url(mut self, url: impl Into<String>) -> Self {
        self.logo_url = Some(url.into());
        self
    }
}

/// A company together with its open jobs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

pub(crate) fn company_from_row(row: &PgRow) -> Result<Company> {
    Ok(Company {
        handle: row.try_get("handle")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        num_employees: row.try_get("num_employees")?,
        logo_url: row.try_get("logo_url")?,
    })
}

pub(crate) fn insert_sql() -> String {
    format!(
        "INSERT INTO {} (handle, name, description, num_employees, logo_url) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        TABLE_NAME, SELECT_COLUMNS
    )
}

pub(crate) fn get_sql() -> String {
    format!("SELECT {} FROM {} WHERE handle = $1", SELECT_COLUMNS, TABLE_NAME)
}

pub(crate) fn delete_sql() -> String {
    format!("DELETE FROM {} WHERE handle = $1 RETURNING handle", TABLE_NAME)
}

/// Search statement for `filter`.
///
/// Rejects a `minEmployees` greater than `maxEmployees`; every other unusable
/// filter value is dropped.
pub fn find_all_statement(filter: Option<&FilterCriteria>) -> Result<(String, Vec<Value>)> {
    if let Some(criteria) = filter {
        let min = criteria.get("minEmployees").and_then(parse_integer);
        let max = criteria.get("maxEmployees").and_then(parse_integer);
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(StoreError::validation(
                    "minEmployees cannot be greater than maxEmployees",
                ));
            }
        }
    }

    let clause = build_where_clause(filter, FILTERS)?;
    let mut sql = format!("SELECT {} FROM {}", SELECT_COLUMNS, TABLE_NAME);
    if !clause.is_empty() {
        sql.push(' ');
        sql.push_str(&clause.to_where_sql());
    }
    sql.push_str(" ORDER BY name");

    Ok((sql, clause.values))
}

/// Partial update statement; the handle binds to the last placeholder.
pub fn update_statement(data: &UpdateRequest) -> Result<(String, SetClause)> {
    let set = build_set_clause(data, &FIELDS)?;
    ensure_updatable(&set, UPDATABLE, IMMUTABLE)?;

    let sql = format!(
        "UPDATE {} SET {} WHERE handle = ${} RETURNING {}",
        TABLE_NAME,
        set.to_sql(),
        set.next_index(),
        SELECT_COLUMNS
    );
    Ok((sql, set))
}
