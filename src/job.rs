//! Job resource

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::company::Company;
use crate::error::Result;
use crate::sql::{
    FieldNameMap, FilterCriteria, Predicate, SetClause, UpdateRequest, build_set_clause,
    build_where_clause, ensure_updatable,
};
use crate::types::{ColumnDefinition, ColumnType, TableDefinition};

pub const TABLE_NAME: &str = "jobs";

/// Job fields are stored under their own names.
pub const FIELDS: FieldNameMap = FieldNameMap::IDENTITY;

/// Recognized search filters, applied in this order
pub const FILTERS: &[Predicate] = &[
    Predicate::contains("title", "title"),
    Predicate::at_least("minSalary", "salary"),
    Predicate::flag("hasEquity", "equity", 0),
];

const UPDATABLE: &[&str] = &["title", "salary", "equity"];
const IMMUTABLE: &[&str] = &["id", "companyHandle", "company_handle"];

const SELECT_COLUMNS: &str = "id, title, salary, equity, company_handle";

pub fn table() -> TableDefinition {
    TableDefinition::new(
        TABLE_NAME,
        vec![
            ColumnDefinition::new("id", ColumnType::Serial).primary_key(),
            ColumnDefinition::new("title", ColumnType::Text).not_null(),
            ColumnDefinition::new("salary", ColumnType::Integer).check("salary >= 0"),
            ColumnDefinition::new("equity", ColumnType::decimal(4, 3)).check("equity <= 1.0"),
            ColumnDefinition::new("company_handle", ColumnType::Text)
                .not_null()
                .references_cascade(crate::company::TABLE_NAME, "handle"),
        ],
    )
}

/// A job row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
    /// Filled in by searches, which join the owning company's name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

/// Request to create a job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl NewJob {
    pub fn new(title: impl Into<String>, company_handle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            salary: None,
            equity: None,
            company_handle: company_handle.into(),
        }
    }

    pub fn salary(mut self, salary: i32) -> Self {
        self.salary = Some(salary);
        self
    }

    pub fn equity(mut self, equity: Decimal) -> Self {
        self.equity = Some(equity);
        self
    }
}

/// A job with its owning company in place of the handle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company: Company,
}

pub(crate) fn job_from_row(row: &PgRow) -> Result<Job> {
    Ok(Job {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        salary: row.try_get("salary")?,
        equity: row.try_get("equity")?,
        company_handle: row.try_get("company_handle")?,
        company_name: None,
    })
}

pub(crate) fn insert_sql() -> String {
    format!(
        "INSERT INTO {} (title, salary, equity, company_handle) VALUES ($1, $2, $3, $4) RETURNING {}",
        TABLE_NAME, SELECT_COLUMNS
    )
}

pub(crate) fn get_sql() -> String {
    format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME)
}

pub(crate) fn by_company_sql() -> String {
    format!(
        "SELECT {} FROM {} WHERE company_handle = $1 ORDER BY id",
        SELECT_COLUMNS, TABLE_NAME
    )
}

pub(crate) fn delete_sql() -> String {
    format!("DELETE FROM {} WHERE id = $1 RETURNING id", TABLE_NAME)
}

/// Search statement for `filter`, joining each job's company name.
pub fn find_all_statement(filter: Option<&FilterCriteria>) -> Result<(String, Vec<Value>)> {
    let clause = build_where_clause(filter, FILTERS)?;

    // Filter columns are unqualified; none of them exist on companies.
    let mut sql = format!(
        "SELECT j.id, j.title, j.salary, j.equity, j.company_handle, c.name AS company_name \
         FROM {} j LEFT JOIN {} c ON c.handle = j.company_handle",
        TABLE_NAME,
        crate::company::TABLE_NAME
    );
    if !clause.is_empty() {
        sql.push(' ');
        sql.push_str(&clause.to_where_sql());
    }
    sql.push_str(" ORDER BY title, id");

    Ok((sql, clause.values))
}

/// Partial update statement; the job id binds to the last placeholder.
pub fn update_statement(data: &UpdateRequest) -> Result<(String, SetClause)> {
    let set = build_set_clause(data, &FIELDS)?;
    ensure_updatable(&set, UPDATABLE, IMMUTABLE)?;

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ${} RETURNING {}",
        TABLE_NAME,
        set.to_sql(),
        set.next_index(),
        SELECT_COLUMNS
    );
    Ok((sql, set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use serde_json::json;

    fn data(value: Value) -> UpdateRequest {
        value.as_object().cloned().expect("object literal")
    }

    // ==================== Search ====================

    #[test]
    fn test_find_all_unfiltered() {
        let (sql, values) = find_all_statement(None).unwrap();
        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("ORDER BY title, id"));
        assert!(values.is_empty());
    }

    #[test]
    fn test_find_all_title_and_min_salary() {
        let criteria = FilterCriteria::from_pairs([("title", "job1"), ("minSalary", "1")]);
        let (sql, values) = find_all_statement(Some(&criteria)).unwrap();

        assert!(sql.contains("WHERE \"title\" ILIKE $1 AND \"salary\" >= $2 ORDER BY"));
        assert_eq!(values, vec![json!("%job1%"), json!(1)]);
    }

    #[test]
    fn test_find_all_has_equity() {
        let criteria = FilterCriteria::from_pairs([("hasEquity", "true")]);
        let (sql, values) = find_all_statement(Some(&criteria)).unwrap();
        assert!(sql.contains("WHERE \"equity\" >= $1"));
        assert_eq!(values, vec![json!(0)]);

        let criteria = FilterCriteria::from_pairs([("hasEquity", "false")]);
        let (sql, values) = find_all_statement(Some(&criteria)).unwrap();
        assert!(!sql.contains("WHERE"));
        assert!(values.is_empty());
    }

    #[test]
    fn test_find_all_bad_salary_is_dropped() {
        let criteria = FilterCriteria::from_pairs([("minSalary", "nope")]);
        let (sql, values) = find_all_statement(Some(&criteria)).unwrap();
        assert!(!sql.contains("WHERE"));
        assert!(values.is_empty());
    }

    // ==================== Update ====================

    #[test]
    fn test_update_statement() {
        let (sql, set) = update_statement(&data(json!({"salary": 500, "equity": "0.2"}))).unwrap();

        assert_eq!(
            sql,
            "UPDATE jobs SET \"salary\"=$1, \"equity\"=$2 WHERE id = $3 \
             RETURNING id, title, salary, equity, company_handle"
        );
        assert_eq!(set.columns, vec!["salary", "equity"]);
    }

    #[test]
    fn test_update_rejects_keys() {
        for field in ["id", "companyHandle"] {
            let mut req = UpdateRequest::new();
            req.insert(field.to_string(), json!("x"));
            let err = update_statement(&req).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{} accepted", field);
        }
    }

    // ==================== Models ====================

    #[test]
    fn test_new_job_deserializes() {
        let job: NewJob = serde_json::from_value(json!({
            "title": "Engineer",
            "salary": 100,
            "equity": "0.1",
            "companyHandle": "c1"
        }))
        .unwrap();

        assert_eq!(job.salary, Some(100));
        assert_eq!(job.equity, Some(Decimal::new(1, 1)));
        assert_eq!(job.company_handle, "c1");
    }

    #[test]
    fn test_job_omits_missing_company_name() {
        let job = Job {
            id: 1,
            title: "J1".into(),
            salary: None,
            equity: None,
            company_handle: "c1".into(),
            company_name: None,
        };
        let value = serde_json::to_value(&job).unwrap();
        assert!(value.get("companyName").is_none());
        assert_eq!(value["companyHandle"], json!("c1"));
    }
}
