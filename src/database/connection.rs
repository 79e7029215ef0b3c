//! Connection pool management for AlloyDB.

use crate::config::{DatabaseConfig, SslMode};
use crate::constants::APPLICATION_NAME;
use crate::error::ServerError;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::time::Duration;
use tracing::{debug, info};

/// Type alias for the connection pool.
pub type ConnectionPool = PgPool;

/// Build connect options from configuration.
///
/// `statement_timeout` is set on every session so the server cancels a query
/// that outlives the client-side timeout instead of leaving it running.
fn connect_options(config: &DatabaseConfig, statement_timeout: Duration) -> PgConnectOptions {
    let ssl_mode = match config.ssl_mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
    };

    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .ssl_mode(ssl_mode)
        .application_name(APPLICATION_NAME)
        .options([(
            "statement_timeout",
            format!("{}ms", statement_timeout.as_millis()),
        )]);

    if let Some(password) = &config.password {
        options = options.password(password);
    }

    options
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(config.pool.min_connections)
        .max_connections(config.pool.max_connections)
        .acquire_timeout(config.pool.connection_timeout)
        .idle_timeout(Some(config.pool.idle_timeout))
}

/// Create a connection pool from configuration.
///
/// Opens one connection up front so unreachable hosts and bad credentials
/// fail here rather than on the first tool call.
pub async fn create_pool(
    config: &DatabaseConfig,
    statement_timeout: Duration,
) -> Result<ConnectionPool, ServerError> {
    info!(
        "Creating connection pool for {} via {}:{} (min: {}, max: {})",
        config.instance_connection_name(),
        config.host,
        config.port,
        config.pool.min_connections,
        config.pool.max_connections
    );

    let pool = pool_options(config)
        .connect_with(connect_options(config, statement_timeout))
        .await
        .map_err(|e| match e {
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                ServerError::connection_with_source("Failed to establish initial connection", e)
            }
            other => ServerError::from(other),
        })?;

    debug!("Initial connection established");
    info!("Connection pool created successfully");
    Ok(pool)
}

/// Create a pool that connects on first use.
///
/// Used when startup must not block on the database, and by tests that
/// exercise paths which never reach it.
pub fn create_lazy_pool(config: &DatabaseConfig, statement_timeout: Duration) -> ConnectionPool {
    pool_options(config).connect_lazy_with(connect_options(config, statement_timeout))
}

/// Get pool health status.
pub fn pool_status(pool: &ConnectionPool) -> PoolStatus {
    let total = pool.size() as usize;
    let idle = pool.num_idle();
    PoolStatus {
        total_connections: total,
        idle_connections: idle,
        in_use_connections: total.saturating_sub(idle),
        closed: pool.is_closed(),
    }
}

/// Pool status information.
#[derive(Debug, Clone)]
pub struct PoolStatus {
    /// Total number of connections in the pool.
    pub total_connections: usize,
    /// Number of idle connections available for checkout.
    pub idle_connections: usize,
    /// Number of connections currently checked out.
    pub in_use_connections: usize,
    /// Whether the pool has been closed.
    pub closed: bool,
}
