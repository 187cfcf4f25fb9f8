//! User resource and job applications
//!
//! Passwords are stored exactly as given: callers hash them before they
//! reach the store, and user rows returned from here never include them.

use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::error::Result;
use crate::sql::{FieldNameMap, SetClause, UpdateRequest, build_set_clause, ensure_updatable};
use crate::types::{ColumnDefinition, ColumnType, TableDefinition};

pub const TABLE_NAME: &str = "users";
pub const APPLICATIONS_TABLE_NAME: &str = "applications";

/// External field names that differ from their column
pub const FIELDS: FieldNameMap = FieldNameMap::new(&[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("isAdmin", "is_admin"),
]);

const UPDATABLE: &[&str] = &["password", "first_name", "last_name", "email", "is_admin"];
const IMMUTABLE: &[&str] = &["username"];

const SELECT_COLUMNS: &str = "username, first_name, last_name, email, is_admin";

pub fn table() -> TableDefinition {
    TableDefinition::new(
        TABLE_NAME,
        vec![
            ColumnDefinition::new("username", ColumnType::Text).primary_key(),
            ColumnDefinition::new("password", ColumnType::Text).not_null(),
            ColumnDefinition::new("first_name", ColumnType::Text).not_null(),
            ColumnDefinition::new("last_name", ColumnType::Text).not_null(),
            ColumnDefinition::new("email", ColumnType::Text)
                .not_null()
                .check("position('@' IN email) > 1"),
            ColumnDefinition::new("is_admin", ColumnType::Boolean)
                .not_null()
                .default("FALSE"),
        ],
    )
}

pub fn applications_table() -> TableDefinition {
    TableDefinition::new(
        APPLICATIONS_TABLE_NAME,
        vec![
            ColumnDefinition::new("username", ColumnType::Text)
                .not_null()
                .references_cascade(TABLE_NAME, "username"),
            ColumnDefinition::new("job_id", ColumnType::Integer)
                .not_null()
                .references_cascade(crate::job::TABLE_NAME, "id"),
        ],
    )
    .with_primary_key(&["username", "job_id"])
}

/// A user row, without the password
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Request to register a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    /// Already-hashed password
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// A user together with the ids of the jobs they applied to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub applications: Vec<i32>,
}

pub(crate) fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        is_admin: row.try_get("is_admin")?,
    })
}

pub(crate) fn insert_sql() -> String {
    format!(
        "INSERT INTO {} (username, password, first_name, last_name, email, is_admin) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        TABLE_NAME, SELECT_COLUMNS
    )
}

pub(crate) fn get_sql() -> String {
    format!("SELECT {} FROM {} WHERE username = $1", SELECT_COLUMNS, TABLE_NAME)
}

pub(crate) fn find_all_sql() -> String {
    format!("SELECT {} FROM {} ORDER BY username", SELECT_COLUMNS, TABLE_NAME)
}

pub(crate) fn delete_sql() -> String {
    format!("DELETE FROM {} WHERE username = $1 RETURNING username", TABLE_NAME)
}

pub(crate) fn applications_sql() -> String {
    format!(
        "SELECT job_id FROM {} WHERE username = $1 ORDER BY job_id",
        APPLICATIONS_TABLE_NAME
    )
}

pub(crate) fn apply_sql() -> String {
    format!(
        "INSERT INTO {} (username, job_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        APPLICATIONS_TABLE_NAME
    )
}

/// Partial update statement; the username binds to the last placeholder.
pub fn update_statement(data: &UpdateRequest) -> Result<(String, SetClause)> {
    let set = build_set_clause(data, &FIELDS)?;
    ensure_updatable(&set, UPDATABLE, IMMUTABLE)?;

    let sql = format!(
        "UPDATE {} SET {} WHERE username = ${} RETURNING {}",
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
    use crate::sql::DdlGenerator;
    use serde_json::{Value, json};

    fn data(value: Value) -> UpdateRequest {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn test_update_statement() {
        let (sql, set) = update_statement(&data(json!({
            "firstName": "Bob",
            "email": "new@email.com"
        })))
        .unwrap();

        assert_eq!(
            sql,
            "UPDATE users SET \"first_name\"=$1, \"email\"=$2 WHERE username = $3 \
             RETURNING username, first_name, last_name, email, is_admin"
        );
        assert_eq!(set.values, vec![json!("Bob"), json!("new@email.com")]);
    }

    #[test]
    fn test_update_password_passes_through() {
        let (sql, set) = update_statement(&data(json!({"password": "$2b$12$hash"}))).unwrap();
        assert!(sql.contains("\"password\"=$1"));
        assert_eq!(set.values, vec![json!("$2b$12$hash")]);
    }

    #[test]
    fn test_update_rejects_username() {
        let err = update_statement(&data(json!({"username": "other"}))).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_user_never_serializes_password() {
        let user = User {
            username: "u1".into(),
            first_name: "U1F".into(),
            last_name: "U1L".into(),
            email: "u1@email.com".into(),
            is_admin: false,
        };
        let value = serde_json::to_value(UserDetail {
            user,
            applications: vec![3, 7],
        })
        .unwrap();

        assert!(value.get("password").is_none());
        assert_eq!(value["firstName"], json!("U1F"));
        assert_eq!(value["applications"], json!([3, 7]));
    }

    #[test]
    fn test_new_user_defaults_non_admin() {
        let user: NewUser = serde_json::from_value(json!({
            "username": "new",
            "password": "hashed",
            "firstName": "F",
            "lastName": "L",
            "email": "new@email.com"
        }))
        .unwrap();
        assert!(!user.is_admin);
    }

    #[test]
    fn test_applications_table_ddl() {
        let ddl = DdlGenerator::generate_create_table(&applications_table());
        assert!(ddl.contains("PRIMARY KEY (\"username\", \"job_id\")"));
        assert!(ddl.contains("REFERENCES \"jobs\"(\"id\") ON DELETE CASCADE"));
    }
}
