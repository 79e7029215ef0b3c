//! Graceful shutdown handling with connection draining.
//!
//! This module provides:
//! - Signal handling (SIGTERM, SIGHUP, Ctrl+C)
//! - Draining of checked-out pool connections with a configurable timeout
//! - Bounded pool close

use crate::constants::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_FORCE_TIMEOUT, DRAIN_POLL_INTERVAL};
use crate::database::{pool_status, ConnectionPool};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Shutdown signal that can be awaited.
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait for the shutdown signal.
    pub async fn recv(&mut self) {
        let _ = self.receiver.wait_for(|&v| v).await;
    }
}

/// Controller for managing graceful shutdown.
pub struct ShutdownController {
    /// Sender to notify all listeners of shutdown.
    sender: watch::Sender<bool>,

    /// Set by the first call to `shutdown`.
    shutting_down: AtomicBool,

    /// How long to wait for in-use connections to return.
    drain_timeout: Duration,

    /// How long the pool close may take after draining.
    force_timeout: Duration,
}

/// Shutdown phases, logged as cleanup progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// Shutdown has been initiated.
    Initiated,

    /// Waiting for checked-out connections to return to the pool.
    DrainingConnections,

    /// Closing the connection pool.
    ClosingPool,

    /// Final cleanup complete.
    Complete,
}

impl std::fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownPhase::Initiated => write!(f, "initiated"),
            ShutdownPhase::DrainingConnections => write!(f, "draining_connections"),
            ShutdownPhase::ClosingPool => write!(f, "closing_pool"),
            ShutdownPhase::Complete => write!(f, "complete"),
        }
    }
}

impl ShutdownController {
    /// Create a new shutdown controller with default timeouts.
    pub fn new() -> Self {
        Self::with_timeouts(DEFAULT_DRAIN_TIMEOUT, DEFAULT_FORCE_TIMEOUT)
    }

    /// Create a shutdown controller with custom timeouts.
    pub fn with_timeouts(drain_timeout: Duration, force_timeout: Duration) -> Self {
        let (sender, _) = watch::channel(false);

        Self {
            sender,
            shutting_down: AtomicBool::new(false),
            drain_timeout,
            force_timeout,
        }
    }

    /// Get a shutdown signal receiver.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Initiate shutdown. Only the first call has any effect.
    pub fn shutdown(&self) {
        if self
            .shutting_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Initiating graceful shutdown...");
            self.sender.send_replace(true);
            log_phase(ShutdownPhase::Initiated);
        }
    }

    /// Perform graceful shutdown of the connection pool.
    ///
    /// Waits up to the drain timeout for in-use connections to be returned,
    /// then closes the pool, giving up after the force timeout.
    pub async fn graceful_shutdown(&self, pool: &ConnectionPool) {
        self.shutdown();

        log_phase(ShutdownPhase::DrainingConnections);
        self.drain_connections(pool).await;

        log_phase(ShutdownPhase::ClosingPool);
        if tokio::time::timeout(self.force_timeout, pool.close())
            .await
            .is_err()
        {
            warn!(
                "Pool close did not finish within {} ms; abandoning remaining connections",
                self.force_timeout.as_millis()
            );
        }

        log_phase(ShutdownPhase::Complete);
        info!("Graceful shutdown complete");
    }

    async fn drain_connections(&self, pool: &ConnectionPool) {
        let start = std::time::Instant::now();

        loop {
            let in_use = pool_status(pool).in_use_connections;

            if in_use == 0 {
                info!("All connections drained");
                break;
            }

            if start.elapsed() > self.drain_timeout {
                warn!(
                    "Drain timeout exceeded with {} connections still in use",
                    in_use
                );
                break;
            }

            info!("Waiting for {} in-use connections to return...", in_use);
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }

    /// Get the drain timeout.
    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    /// Get the force timeout.
    pub fn force_timeout(&self) -> Duration {
        self.force_timeout
    }
}

fn log_phase(phase: ShutdownPhase) {
    info!("Shutdown phase: {}", phase);
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared shutdown controller type.
pub type SharedShutdownController = Arc<ShutdownController>;

/// Create a shutdown controller with custom timeouts.
pub fn new_shutdown_controller_with_timeouts(
    drain_timeout: Duration,
    force_timeout: Duration,
) -> SharedShutdownController {
    Arc::new(ShutdownController::with_timeouts(
        drain_timeout,
        force_timeout,
    ))
}

/// Install signal handlers for graceful shutdown.
///
/// Ctrl+C, SIGTERM and SIGHUP all trigger the shutdown controller.
pub async fn install_signal_handlers(controller: SharedShutdownController) {
    let ctrl_c_controller = controller.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating shutdown...");
                ctrl_c_controller.shutdown();
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C signal: {}", e);
            }
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        for (kind, name) in [
            (SignalKind::terminate(), "SIGTERM"),
            (SignalKind::hangup(), "SIGHUP"),
        ] {
            let controller = controller.clone();
            tokio::spawn(async move {
                match signal(kind) {
                    Ok(mut stream) => {
                        stream.recv().await;
                        info!("Received {}, initiating shutdown...", name);
                        controller.shutdown();
                    }
                    Err(e) => {
                        error!("Failed to install {} handler: {}", name, e);
                    }
                }
            });
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownConfig {
    /// Timeout for draining in-use connections.
    pub drain_timeout: Duration,

    /// Timeout for closing the pool after draining.
    pub force_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            force_timeout: DEFAULT_FORCE_TIMEOUT,
        }
    }
}

impl ShutdownConfig {
    /// Create configuration from `SHUTDOWN_DRAIN_TIMEOUT` and
    /// `SHUTDOWN_FORCE_TIMEOUT` (seconds).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Malformed values are logged and replaced by the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: Duration| match lookup(key) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    warn!("Ignoring invalid {} value '{}'", key, raw);
                    default
                }
            },
            None => default,
        };

        Self {
            drain_timeout: read("SHUTDOWN_DRAIN_TIMEOUT", DEFAULT_DRAIN_TIMEOUT),
            force_timeout: read("SHUTDOWN_FORCE_TIMEOUT", DEFAULT_FORCE_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, PoolConfig, SslMode};
    use crate::database::create_lazy_pool;

    fn lazy_pool() -> ConnectionPool {
        let config = DatabaseConfig {
            project_id: "p".to_string(),
            region: "r".to_string(),
            cluster_id: "c".to_string(),
            instance_id: "i".to_string(),
            host: "127.0.0.1".to_string(),
            port: 1,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: None,
            ssl_mode: SslMode::Disable,
            pool: PoolConfig::default(),
        };
        create_lazy_pool(&config, Duration::from_secs(1))
    }

    fn is_signaled(signal: &ShutdownSignal) -> bool {
        *signal.receiver.borrow()
    }

    #[test]
    fn test_shutdown_controller_creation() {
        let controller = ShutdownController::new();
        assert!(!is_signaled(&controller.signal()));
        assert_eq!(controller.drain_timeout(), Duration::from_secs(30));
        assert_eq!(controller.force_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_shutdown_signal() {
        let controller = ShutdownController::new();
        let signal = controller.signal();

        assert!(!is_signaled(&signal));

        controller.shutdown();
        assert!(is_signaled(&signal));
        assert!(is_signaled(&controller.signal()));
    }

    #[test]
    fn test_shutdown_idempotent() {
        let controller = ShutdownController::new();
        let mut signal = controller.signal();

        controller.shutdown();
        assert!(signal.receiver.has_changed().unwrap());
        signal.receiver.borrow_and_update();

        controller.shutdown();
        assert!(!signal.receiver.has_changed().unwrap());
        assert!(is_signaled(&signal));
    }

    #[tokio::test]
    async fn test_signal_recv_wakes_waiter() {
        let controller = new_shutdown_controller_with_timeouts(
            Duration::from_millis(100),
            Duration::from_millis(100),
        );
        let mut signal = controller.signal();

        let waiter = tokio::spawn(async move { signal.recv().await });
        controller.shutdown();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_graceful_shutdown_closes_pool() {
        let controller = new_shutdown_controller_with_timeouts(
            Duration::from_millis(100),
            Duration::from_millis(500),
        );
        let signal = controller.signal();
        let pool = lazy_pool();

        controller.graceful_shutdown(&pool).await;

        assert!(is_signaled(&signal));
        assert!(pool.is_closed());
    }

    #[test]
    fn test_shutdown_config_from_lookup() {
        let config = ShutdownConfig::from_lookup(|key| match key {
            "SHUTDOWN_DRAIN_TIMEOUT" => Some("5".to_string()),
            "SHUTDOWN_FORCE_TIMEOUT" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.drain_timeout, Duration::from_secs(5));
        assert_eq!(config.force_timeout, Duration::from_secs(10));

        assert_eq!(ShutdownConfig::from_lookup(|_| None), ShutdownConfig::default());
    }

    #[test]
    fn test_shutdown_phase_display() {
        assert_eq!(ShutdownPhase::Initiated.to_string(), "initiated");
        assert_eq!(
            ShutdownPhase::DrainingConnections.to_string(),
            "draining_connections"
        );
        assert_eq!(ShutdownPhase::ClosingPool.to_string(), "closing_pool");
        assert_eq!(ShutdownPhase::Complete.to_string(), "complete");
    }
}
