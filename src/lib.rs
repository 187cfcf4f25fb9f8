//! # jobly-store
//!
//! PostgreSQL data access for companies, jobs and users, built around a
//! small dynamic query composer.
//!
//! Partial updates and search filters are turned into parameterized SQL
//! fragments: clause text holds only quoted column identifiers and `$n`
//! placeholders, and the bound values travel alongside in the same order.
//!
//! ## Features
//!
//! - **Partial Updates**: `SET` clauses built from only the fields a caller supplied
//! - **Lenient Search Filters**: declarative per-resource predicate tables; unusable values are dropped
//! - **Positional Parameters**: one allocator per composition, trailing fixed values get the next index
//! - **SQL Injection Prevention**: values are always bound, identifiers are always quoted
//!
//! ## Composing Clauses
//!
//! ```rust
//! use jobly_store::sql::{build_set_clause, build_where_clause, FieldNameMap, FilterCriteria, Predicate};
//!
//! const FIELDS: FieldNameMap = FieldNameMap::new(&[("numEmployees", "num_employees")]);
//! const FILTERS: &[Predicate] = &[
//!     Predicate::contains("name", "name"),
//!     Predicate::at_least("minEmployees", "num_employees"),
//! ];
//!
//! let data = serde_json::json!({"numEmployees": 10, "description": "New"});
//! let set = build_set_clause(data.as_object().unwrap(), &FIELDS).unwrap();
//! let sql = format!("UPDATE companies SET {} WHERE handle = ${}", set.to_sql(), set.next_index());
//! assert_eq!(sql, "UPDATE companies SET \"num_employees\"=$1, \"description\"=$2 WHERE handle = $3");
//!
//! let filter = FilterCriteria::from_pairs([("minEmployees", "nope"), ("name", "net")]);
//! let clause = build_where_clause(Some(&filter), FILTERS).unwrap();
//! assert_eq!(clause.to_sql(), "\"name\" ILIKE $1");
//! ```
//!
//! ## Using the Store
//!
//! ```rust,no_run
//! use jobly_store::{FilterCriteria, JoblyStore, NewCompany, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = JoblyStore::new(StoreConfig::builder("postgres://localhost/jobly").build()).await?;
//!     store.ensure_schema().await?;
//!
//!     store
//!         .create_company(NewCompany::new("acme", "Acme", "Anvils").num_employees(40))
//!         .await?;
//!
//!     let filter = FilterCriteria::from_pairs([("minEmployees", "10")]);
//!     let companies = store.find_companies(Some(&filter)).await?;
//!     println!("{} companies", companies.len());
//!     Ok(())
//! }
//! ```

pub mod company;
pub mod config;
pub mod error;
pub mod job;
pub mod sql;
pub mod store;
pub mod types;
pub mod user;

pub use company::{Company, CompanyDetail, NewCompany};
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{Result, StoreError};
pub use job::{Job, JobDetail, NewJob};
pub use sql::{
    FieldNameMap, FilterCriteria, ParamAllocator, Predicate, PredicateKind, SetClause,
    UpdateRequest, WhereClause, build_set_clause, build_where_clause,
};
pub use store::JoblyStore;
pub use types::{ColumnDefinition, ColumnType, TableDefinition};
pub use user::{NewUser, User, UserDetail};
