//! SQL composition for the store
//!
//! Builds parameterized clause text plus ordered values, binds those values
//! onto `sqlx` queries, and generates table DDL.

pub mod bind;
pub mod ddl;
pub mod filter;
pub mod params;
pub mod sanitize;
pub mod update;

pub use ddl::DdlGenerator;
pub use filter::{
    FilterCriteria, Predicate, PredicateKind, WhereClause, build_where_clause, unrecognized_keys,
};
pub use params::ParamAllocator;
pub use sanitize::quote_identifier;
pub use update::{FieldNameMap, SetClause, UpdateRequest, build_set_clause, ensure_updatable};
