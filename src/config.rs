//! Configuration for JoblyStore
//!
//! Provides a builder pattern for configuring the store's connection pool.

use std::time::Duration;

use crate::error::{Result, StoreError};

/// Default number of pooled connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time to wait for a free connection
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// PostgreSQL database URL
    pub database_url: String,
    /// Maximum number of pooled connections (default: 5)
    pub max_connections: u32,
    /// How long to wait for a pooled connection (default: 30s)
    pub acquire_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> StoreConfigBuilder {
        StoreConfigBuilder::new(database_url)
    }

    /// Build a configuration from the process environment.
    ///
    /// Reads `DATABASE_URL` (required) and `DATABASE_MAX_CONNECTIONS` (optional).
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| StoreError::Connection("DATABASE_URL is not set".to_string()))?;

        let mut builder = Self::builder(database_url);

        if let Some(raw) = lookup("DATABASE_MAX_CONNECTIONS") {
            let max = raw.parse::<u32>().map_err(|_| {
                StoreError::validation(format!(
                    "DATABASE_MAX_CONNECTIONS must be a positive integer, got '{}'",
                    raw
                ))
            })?;
            builder = builder.max_connections(max);
        }

        Ok(builder.build())
    }
}

/// Builder for StoreConfig
#[derive(Debug)]
pub struct StoreConfigBuilder {
    database_url: String,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl StoreConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Set the maximum pool size (default: 5). Zero is raised to one.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// Set the connection acquire timeout (default: 30s)
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url,
            max_connections: self.max_connections,
            acquire_timeout: self.acquire_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // StoreConfig Default Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = StoreConfig::builder("postgres://localhost/jobly").build();

        assert_eq!(config.database_url, "postgres://localhost/jobly");
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.acquire_timeout, DEFAULT_ACQUIRE_TIMEOUT);
    }

    #[test]
    fn test_builder_accepts_string() {
        let config = StoreConfig::builder(String::from("postgres://localhost/db")).build();
        assert_eq!(config.database_url, "postgres://localhost/db");
    }

    // =========================================================================
    // Pool Configuration Tests
    // =========================================================================

    #[test]
    fn test_custom_max_connections() {
        let config = StoreConfig::builder("postgres://localhost/jobly")
            .max_connections(20)
            .build();

        assert_eq!(config.max_connections, 20);
    }

    #[test]
    fn test_zero_max_connections_is_raised() {
        let config = StoreConfig::builder("postgres://localhost/jobly")
            .max_connections(0)
            .build();

        assert_eq!(config.max_connections, 1);
    }

    #[test]
    fn test_custom_acquire_timeout() {
        let config = StoreConfig::builder("postgres://localhost/jobly")
            .acquire_timeout(Duration::from_secs(3))
            .build();

        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_builder_order_independence() {
        let config1 = StoreConfig::builder("postgres://localhost/jobly")
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(1))
            .build();

        let config2 = StoreConfig::builder("postgres://localhost/jobly")
            .acquire_timeout(Duration::from_secs(1))
            .max_connections(8)
            .build();

        assert_eq!(config1.max_connections, config2.max_connections);
        assert_eq!(config1.acquire_timeout, config2.acquire_timeout);
    }

    // =========================================================================
    // Environment Tests
    // =========================================================================

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_from_vars_reads_url_and_pool_size() {
        let config = StoreConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/jobly"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://localhost/jobly");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.acquire_timeout, DEFAULT_ACQUIRE_TIMEOUT);
    }

    #[test]
    fn test_from_vars_defaults_pool_size() {
        let config =
            StoreConfig::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/jobly")])).unwrap();
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_from_vars_requires_url() {
        let err = StoreConfig::from_vars(vars(&[])).unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[test]
    fn test_from_vars_rejects_bad_pool_size() {
        let err = StoreConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/jobly"),
            ("DATABASE_MAX_CONNECTIONS", "lots"),
        ]))
        .unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert!(err.to_string().contains("lots"));
    }

    // =========================================================================
    // Debug Trait Tests
    // =========================================================================

    #[test]
    fn test_builder_debug() {
        let builder = StoreConfig::builder("postgres://localhost/jobly");
        let debug_str = format!("{:?}", builder);
        assert!(debug_str.contains("StoreConfigBuilder"));
    }
}
