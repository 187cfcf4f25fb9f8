//! JoblyStore - Main entry point for company, job and user data access
//!
//! Every dynamic statement is composed by [`crate::sql`] and handed to
//! exactly one `sqlx` query together with its values.

use sqlx::PgPool;
use sqlx::Row;
use sqlx::error::ErrorKind;
use sqlx::postgres::PgPoolOptions;

use crate::company::{self, Company, CompanyDetail, NewCompany};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::job::{self, Job, JobDetail, NewJob};
use crate::sql::bind::{bind_all, bind_columns};
use crate::sql::{DdlGenerator, FilterCriteria, UpdateRequest};
use crate::types::TableDefinition;
use crate::user::{self, NewUser, User, UserDetail};

/// PostgreSQL-backed store for companies, jobs, users and applications
pub struct JoblyStore {
    /// Database connection pool
    pool: PgPool,
}

impl JoblyStore {
    /// Connect to the database described by `config`
    pub async fn new(config: StoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Connection(format!("Database connection failed: {}", e)))?;

        tracing::info!(
            max_connections = config.max_connections,
            "connected to database"
        );

        Ok(Self { pool })
    }

    /// Create a store from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All tables in dependency order
    pub fn tables() -> Vec<TableDefinition> {
        vec![
            company::table(),
            job::table(),
            user::table(),
            user::applications_table(),
        ]
    }

    /// Create any missing tables
    pub async fn ensure_schema(&self) -> Result<()> {
        for table in Self::tables() {
            let ddl = DdlGenerator::generate_create_table(&table);
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        tracing::info!("schema ready");
        Ok(())
    }

    // =========================================================================
    // Company Operations
    // =========================================================================

    /// Create a company; a taken handle or name is a conflict.
    pub async fn create_company(&self, data: NewCompany) -> Result<Company> {
        let row = sqlx::query(&company::insert_sql())
            .bind(&data.handle)
            .bind(&data.name)
            .bind(&data.description)
            .bind(data.num_employees)
            .bind(&data.logo_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                write_error(e, || format!("Duplicate company: {}", data.handle), String::new)
            })?;

        company::company_from_row(&row)
    }

    /// Search companies. An absent filter, or one whose every value is
    /// unusable, lists all companies; no match is an empty list.
    pub async fn find_companies(&self, filter: Option<&FilterCriteria>) -> Result<Vec<Company>> {
        let (sql, values) = company::find_all_statement(filter)?;
        log_statement(&sql, values.len());

        let rows = bind_all(sqlx::query(&sql), &values)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(company::company_from_row).collect()
    }

    /// Get a company with its jobs
    pub async fn get_company(&self, handle: &str) -> Result<CompanyDetail> {
        let row = sqlx::query(&company::get_sql())
            .bind(handle)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("No company: {}", handle)))?;
        let company = company::company_from_row(&row)?;

        let job_rows = sqlx::query(&job::by_company_sql())
            .bind(handle)
            .fetch_all(&self.pool)
            .await?;
        let jobs = job_rows
            .iter()
            .map(job::job_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Apply a partial update to a company
    pub async fn update_company(&self, handle: &str, data: &UpdateRequest) -> Result<Company> {
        let (sql, set) = company::update_statement(data)?;
        log_statement(&sql, set.values.len() + 1);

        let row = bind_columns(sqlx::query(&sql), &company::table(), &set.columns, &set.values)?
            .bind(handle)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, || "Company name already taken".to_string(), String::new))?
            .ok_or_else(|| StoreError::not_found(format!("No company: {}", handle)))?;

        company::company_from_row(&row)
    }

    /// Delete a company and, through the foreign key, its jobs
    pub async fn remove_company(&self, handle: &str) -> Result<()> {
        sqlx::query(&company::delete_sql())
            .bind(handle)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("No company: {}", handle)))?;
        Ok(())
    }

    // =========================================================================
    // Job Operations
    // =========================================================================

    /// Create a job for an existing company
    pub async fn create_job(&self, data: NewJob) -> Result<Job> {
        let row = sqlx::query(&job::insert_sql())
            .bind(&data.title)
            .bind(data.salary)
            .bind(data.equity)
            .bind(&data.company_handle)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                write_error(e, String::new, || {
                    format!("No company: {}", data.company_handle)
                })
            })?;

        job::job_from_row(&row)
    }

    /// Search jobs, same filter semantics as [`Self::find_companies`]
    pub async fn find_jobs(&self, filter: Option<&FilterCriteria>) -> Result<Vec<Job>> {
        let (sql, values) = job::find_all_statement(filter)?;
        log_statement(&sql, values.len());

        let rows = bind_all(sqlx::query(&sql), &values)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<Job> {
                let mut job = job::job_from_row(row)?;
                job.company_name = row.try_get("company_name")?;
                Ok(job)
            })
            .collect()
    }

    /// Get a job with its company
    pub async fn get_job(&self, id: i32) -> Result<JobDetail> {
        let row = sqlx::query(&job::get_sql())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("No job: {}", id)))?;
        let job = job::job_from_row(&row)?;

        let company_row = sqlx::query(&company::get_sql())
            .bind(&job.company_handle)
            .fetch_one(&self.pool)
            .await?;

        Ok(JobDetail {
            id: job.id,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company: company::company_from_row(&company_row)?,
        })
    }

    /// Apply a partial update to a job
    pub async fn update_job(&self, id: i32, data: &UpdateRequest) -> Result<Job> {
        let (sql, set) = job::update_statement(data)?;
        log_statement(&sql, set.values.len() + 1);

        let row = bind_columns(sqlx::query(&sql), &job::table(), &set.columns, &set.values)?
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, String::new, String::new))?
            .ok_or_else(|| StoreError::not_found(format!("No job: {}", id)))?;

        job::job_from_row(&row)
    }

    pub async fn remove_job(&self, id: i32) -> Result<()> {
        sqlx::query(&job::delete_sql())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("No job: {}", id)))?;
        Ok(())
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    /// Register a user. The password must already be hashed.
    pub async fn register_user(&self, data: NewUser) -> Result<User> {
        let row = sqlx::query(&user::insert_sql())
            .bind(&data.username)
            .bind(&data.password)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.email)
            .bind(data.is_admin)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                write_error(e, || format!("Duplicate username: {}", data.username), String::new)
            })?;

        user::user_from_row(&row)
    }

    /// List all users ordered by username
    pub async fn find_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&user::find_all_sql())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user::user_from_row).collect()
    }

    /// Get a user with the ids of the jobs they applied to
    pub async fn get_user(&self, username: &str) -> Result<UserDetail> {
        let row = sqlx::query(&user::get_sql())
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("No user: {}", username)))?;
        let user = user::user_from_row(&row)?;

        let applications = sqlx::query(&user::applications_sql())
            .bind(username)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| row.try_get::<i32, _>("job_id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(UserDetail { user, applications })
    }

    /// Apply a partial update to a user. A new password must already be hashed.
    pub async fn update_user(&self, username: &str, data: &UpdateRequest) -> Result<User> {
        let (sql, set) = user::update_statement(data)?;
        log_statement(&sql, set.values.len() + 1);

        let row = bind_columns(sqlx::query(&sql), &user::table(), &set.columns, &set.values)?
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, String::new, String::new))?
            .ok_or_else(|| StoreError::not_found(format!("No user: {}", username)))?;

        user::user_from_row(&row)
    }

    pub async fn remove_user(&self, username: &str) -> Result<()> {
        sqlx::query(&user::delete_sql())
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("No user: {}", username)))?;
        Ok(())
    }

    /// Record that `username` applied to job `job_id`.
    ///
    /// Runs in one transaction; the composite key on applications turns a
    /// concurrent duplicate into a conflict instead of a second row.
    pub async fn apply_to_job(&self, username: &str, job_id: i32) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&user::get_sql())
            .bind(username)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("No user: {}", username)))?;

        sqlx::query(&job::get_sql())
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("No job: {}", job_id)))?;

        let result = sqlx::query(&user::apply_sql())
            .bind(username)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                write_error(e, String::new, || {
                    format!("No user or job: {} / {}", username, job_id)
                })
            })?;

        if result.rows_affected() == 0 {
            tracing::warn!(username, job_id, "duplicate application");
            return Err(StoreError::conflict(format!(
                "Already applied: {} to job {}",
                username, job_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }
}

fn log_statement(sql: &str, param_count: usize) {
    tracing::debug!(sql, param_count, "executing composed statement");
}

/// Translate constraint violations on writes into caller-facing errors.
fn write_error(
    err: sqlx::Error,
    conflict: impl FnOnce() -> String,
    missing: impl FnOnce() -> String,
) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let msg = conflict();
            tracing::warn!(%msg, "unique constraint violated");
            return StoreError::conflict(msg);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::not_found(missing());
        }
        if db_err.is_check_violation() || db_err.kind() == ErrorKind::NotNullViolation {
            return StoreError::validation(db_err.message().to_string());
        }
    }
    StoreError::Sql(err)
}
