//! Configuration management for the AlloyDB Survey MCP Server.
//!
//! Configuration is loaded from environment variables following the 12-factor app pattern.
//! It is read once at startup and handed to the server as an immutable value.

use crate::constants::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_DATABASE,
    DEFAULT_FETCH_LIMIT, DEFAULT_HOST, DEFAULT_IDLE_TIMEOUT, DEFAULT_IDLE_TIMEOUT_SECS,
    DEFAULT_LOG_LEVEL, DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_LIMIT, DEFAULT_MIN_CONNECTIONS,
    DEFAULT_PORT, DEFAULT_QUERY_TIMEOUT, DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_SEARCH_LIMIT,
    DEFAULT_SERVER_NAME, DEFAULT_USER,
};
use crate::error::ServerError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection configuration
    pub database: DatabaseConfig,

    /// Query execution configuration
    pub query: QueryConfig,

    /// MCP server identity
    pub server: ServerConfig,
}

/// Database connection configuration.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// GCP project ID
    pub project_id: String,

    /// AlloyDB region
    pub region: String,

    /// AlloyDB cluster ID
    pub cluster_id: String,

    /// AlloyDB instance ID
    pub instance_id: String,

    /// Host to connect to (instance IP or local Auth Proxy)
    pub host: String,

    /// PostgreSQL port (default: 5432)
    pub port: u16,

    /// Database name
    pub database: String,

    /// Database user
    pub user: String,

    /// Database password (optional when the proxy handles IAM auth)
    pub password: Option<String>,

    /// TLS negotiation mode
    pub ssl_mode: SslMode,

    /// Connection pool configuration
    pub pool: PoolConfig,
}

/// TLS negotiation mode for the database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Plain TCP (typical behind the Auth Proxy, which encrypts upstream)
    Disable,
    /// Try TLS, fall back to plain TCP
    #[default]
    Prefer,
    /// Fail if TLS cannot be negotiated
    Require,
}

impl FromStr for SslMode {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disable" | "disabled" | "off" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" | "required" => Ok(SslMode::Require),
            other => Err(ServerError::config(format!(
                "ALLOYDB_SSL_MODE must be one of disable, prefer, require (got '{}')",
                other
            ))),
        }
    }
}

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Connection (acquire) timeout
    pub connection_timeout: Duration,

    /// Idle connection timeout
    pub idle_timeout: Duration,
}

/// Query execution configuration.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Per-query timeout
    pub timeout: Duration,

    /// Row limit for fetches when the caller omits one
    pub default_limit: u32,

    /// Row limit for searches when the caller omits one
    pub search_default_limit: u32,

    /// Hard cap on rows per call
    pub max_limit: u32,
}

/// MCP server identity and logging configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name reported to clients
    pub name: String,

    /// Server version reported to clients
    pub version: String,

    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// ## Required
    /// - `ALLOYDB_PROJECT_ID`: GCP project ID
    /// - `ALLOYDB_REGION`: AlloyDB region
    /// - `ALLOYDB_CLUSTER_ID`: AlloyDB cluster ID
    /// - `ALLOYDB_INSTANCE_ID`: AlloyDB instance ID
    ///
    /// ## Optional
    /// - `ALLOYDB_HOST`: Host to connect to (default: 127.0.0.1, the Auth Proxy)
    /// - `ALLOYDB_PORT`: Port number (default: 5432)
    /// - `ALLOYDB_DATABASE`: Database name (default: postgres)
    /// - `ALLOYDB_USER`: Database user (default: postgres)
    /// - `ALLOYDB_PASSWORD`: Database password
    /// - `ALLOYDB_SSL_MODE`: disable, prefer or require (default: prefer)
    /// - `ALLOYDB_POOL_MIN`: Minimum pool connections (default: 0)
    /// - `ALLOYDB_POOL_MAX`: Maximum pool connections (default: 5)
    /// - `ALLOYDB_CONNECT_TIMEOUT`: Connection timeout in seconds (default: 30)
    /// - `ALLOYDB_IDLE_TIMEOUT`: Idle connection timeout in seconds (default: 300)
    /// - `ALLOYDB_QUERY_TIMEOUT`: Query timeout in seconds (default: 30)
    /// - `SURVEY_DEFAULT_LIMIT`: Default fetch limit (default: 100)
    /// - `SURVEY_SEARCH_DEFAULT_LIMIT`: Default search limit (default: 50)
    /// - `SURVEY_MAX_LIMIT`: Hard row cap per call (default: 1000)
    /// - `MCP_SERVER_NAME`: Server name (default: alloydb-survey-server)
    /// - `MCP_SERVER_VERSION`: Server version (default: crate version)
    /// - `LOG_LEVEL`: Log filter used when `RUST_LOG` is unset (default: info)
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let project_id = env.required("ALLOYDB_PROJECT_ID")?;
        let region = env.required("ALLOYDB_REGION")?;
        let cluster_id = env.required("ALLOYDB_CLUSTER_ID")?;
        let instance_id = env.required("ALLOYDB_INSTANCE_ID")?;

        let host = env.get("ALLOYDB_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = env.parsed("ALLOYDB_PORT", DEFAULT_PORT)?;
        let database = env
            .get("ALLOYDB_DATABASE")
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let user = env.get("ALLOYDB_USER").unwrap_or_else(|| DEFAULT_USER.to_string());
        let password = env.get("ALLOYDB_PASSWORD");

        let ssl_mode = match env.get("ALLOYDB_SSL_MODE") {
            Some(mode) => mode.parse()?,
            None => SslMode::default(),
        };

        // Pool settings
        let min_connections = env.parsed("ALLOYDB_POOL_MIN", DEFAULT_MIN_CONNECTIONS)?;
        let max_connections = env.parsed("ALLOYDB_POOL_MAX", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ServerError::config("ALLOYDB_POOL_MAX must be at least 1"));
        }
        if min_connections > max_connections {
            return Err(ServerError::config(format!(
                "ALLOYDB_POOL_MIN ({}) cannot exceed ALLOYDB_POOL_MAX ({})",
                min_connections, max_connections
            )));
        }

        let connection_timeout_secs =
            env.parsed("ALLOYDB_CONNECT_TIMEOUT", DEFAULT_CONNECTION_TIMEOUT_SECS)?;
        let idle_timeout_secs = env.parsed("ALLOYDB_IDLE_TIMEOUT", DEFAULT_IDLE_TIMEOUT_SECS)?;

        // Query settings
        let query_timeout_secs = env.parsed("ALLOYDB_QUERY_TIMEOUT", DEFAULT_QUERY_TIMEOUT_SECS)?;
        if query_timeout_secs == 0 {
            return Err(ServerError::config("ALLOYDB_QUERY_TIMEOUT must be at least 1 second"));
        }

        let max_limit = env.parsed("SURVEY_MAX_LIMIT", DEFAULT_MAX_LIMIT)?;
        let default_limit = env.parsed("SURVEY_DEFAULT_LIMIT", DEFAULT_FETCH_LIMIT)?;
        let search_default_limit =
            env.parsed("SURVEY_SEARCH_DEFAULT_LIMIT", DEFAULT_SEARCH_LIMIT)?;
        if max_limit == 0 {
            return Err(ServerError::config("SURVEY_MAX_LIMIT must be at least 1"));
        }
        for (key, value) in [
            ("SURVEY_DEFAULT_LIMIT", default_limit),
            ("SURVEY_SEARCH_DEFAULT_LIMIT", search_default_limit),
        ] {
            if value == 0 || value > max_limit {
                return Err(ServerError::config(format!(
                    "{} must be between 1 and SURVEY_MAX_LIMIT ({}), got {}",
                    key, max_limit, value
                )));
            }
        }

        // Server identity
        let name = env
            .get("MCP_SERVER_NAME")
            .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());
        let version = env
            .get("MCP_SERVER_VERSION")
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
        let log_level = env
            .get("LOG_LEVEL")
            .map(|l| l.to_lowercase())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Config {
            database: DatabaseConfig {
                project_id,
                region,
                cluster_id,
                instance_id,
                host,
                port,
                database,
                user,
                password,
                ssl_mode,
                pool: PoolConfig {
                    min_connections,
                    max_connections,
                    connection_timeout: Duration::from_secs(connection_timeout_secs),
                    idle_timeout: Duration::from_secs(idle_timeout_secs),
                },
            },
            query: QueryConfig {
                timeout: Duration::from_secs(query_timeout_secs),
                default_limit,
                search_default_limit,
                max_limit,
            },
            server: ServerConfig {
                name,
                version,
                log_level,
            },
        })
    }
}

impl DatabaseConfig {
    /// AlloyDB instance connection name: `project:region:cluster:instance`.
    pub fn instance_connection_name(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.project_id, self.region, self.cluster_id, self.instance_id
        )
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("instance", &self.instance_connection_name())
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ssl_mode", &self.ssl_mode)
            .field("pool", &self.pool)
            .finish()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: DEFAULT_MIN_CONNECTIONS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
            default_limit: DEFAULT_FETCH_LIMIT,
            search_default_limit: DEFAULT_SEARCH_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Typed accessors over a string lookup.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ServerError> {
        self.get(key)
            .ok_or_else(|| ServerError::config(format!("{} environment variable is required", key)))
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ServerError>
    where
        T: FromStr,
    {
        match self.get(key) {
            Some(raw) => raw.parse().map_err(|_| {
                ServerError::config(format!("{} must be a non-negative integer, got '{}'", key, raw))
            }),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("ALLOYDB_PROJECT_ID", "survey-project"),
        ("ALLOYDB_REGION", "us-central1"),
        ("ALLOYDB_CLUSTER_ID", "survey-cluster"),
        ("ALLOYDB_INSTANCE_ID", "survey-primary"),
    ];

    fn with_required(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(extra);
        pairs
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.database.host, "127.0.0.1");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.database, "postgres");
        assert_eq!(config.database.user, "postgres");
        assert!(config.database.password.is_none());
        assert_eq!(config.database.ssl_mode, SslMode::Prefer);
        assert_eq!(config.database.pool.max_connections, 5);
        assert_eq!(config.query.default_limit, 100);
        assert_eq!(config.query.search_default_limit, 50);
        assert_eq!(config.query.max_limit, 1000);
        assert_eq!(config.query.timeout, Duration::from_secs(30));
        assert_eq!(config.server.name, "alloydb-survey-server");
    }

    #[test]
    fn test_instance_connection_name() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(
            config.database.instance_connection_name(),
            "survey-project:us-central1:survey-cluster:survey-primary"
        );
    }

    #[test]
    fn test_missing_required_field() {
        let pairs: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "ALLOYDB_CLUSTER_ID")
            .collect();
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
        assert!(err.to_string().contains("ALLOYDB_CLUSTER_ID"));
    }

    #[test]
    fn test_blank_required_field_is_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[0] = ("ALLOYDB_PROJECT_ID", "   ");
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("ALLOYDB_PROJECT_ID"));
    }

    #[test]
    fn test_non_numeric_port_rejected() {
        let pairs = with_required(&[("ALLOYDB_PORT", "fivefourthreetwo")]);
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
        assert!(err.to_string().contains("ALLOYDB_PORT"));
    }

    #[test]
    fn test_out_of_range_port_rejected() {
        let pairs = with_required(&[("ALLOYDB_PORT", "70000")]);
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_overrides_applied() {
        let pairs = with_required(&[
            ("ALLOYDB_HOST", "10.20.0.3"),
            ("ALLOYDB_PORT", "6432"),
            ("ALLOYDB_DATABASE", "surveys"),
            ("ALLOYDB_USER", "reader"),
            ("ALLOYDB_PASSWORD", "s3cret"),
            ("ALLOYDB_SSL_MODE", "require"),
            ("ALLOYDB_POOL_MAX", "12"),
            ("ALLOYDB_QUERY_TIMEOUT", "5"),
            ("SURVEY_MAX_LIMIT", "200"),
            ("LOG_LEVEL", "DEBUG"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.database.host, "10.20.0.3");
        assert_eq!(config.database.port, 6432);
        assert_eq!(config.database.database, "surveys");
        assert_eq!(config.database.password.as_deref(), Some("s3cret"));
        assert_eq!(config.database.ssl_mode, SslMode::Require);
        assert_eq!(config.database.pool.max_connections, 12);
        assert_eq!(config.query.timeout, Duration::from_secs(5));
        assert_eq!(config.query.max_limit, 200);
        assert_eq!(config.server.log_level, "debug");
    }

    #[test]
    fn test_pool_bounds_validated() {
        let pairs = with_required(&[("ALLOYDB_POOL_MAX", "0")]);
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let pairs = with_required(&[("ALLOYDB_POOL_MIN", "8"), ("ALLOYDB_POOL_MAX", "4")]);
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("ALLOYDB_POOL_MIN"));
    }

    #[test]
    fn test_default_limit_cannot_exceed_cap() {
        let pairs = with_required(&[("SURVEY_MAX_LIMIT", "50"), ("SURVEY_DEFAULT_LIMIT", "100")]);
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("SURVEY_DEFAULT_LIMIT"));
    }

    #[test]
    fn test_unknown_ssl_mode_rejected() {
        let pairs = with_required(&[("ALLOYDB_SSL_MODE", "verify-sometimes")]);
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let pairs = with_required(&[("ALLOYDB_PASSWORD", "hunter2")]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.min_connections, 0);
        assert_eq!(config.max_connections, 5);
    }
}
