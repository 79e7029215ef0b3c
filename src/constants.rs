//! Centralized constants for the AlloyDB Survey MCP Server.
//!
//! This module contains all magic numbers and default values used throughout
//! the codebase, making them easy to find, understand, and modify.

use std::time::Duration;

// =============================================================================
// Server Identity
// =============================================================================

/// Default MCP server name reported during initialization.
pub const DEFAULT_SERVER_NAME: &str = "alloydb-survey-server";

/// Application name reported to PostgreSQL (`pg_stat_activity.application_name`).
pub const APPLICATION_NAME: &str = "alloydb-survey-mcp-server";

// =============================================================================
// Connection Defaults
// =============================================================================

/// Default database host. The AlloyDB Auth Proxy listens locally by default.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Default database name.
pub const DEFAULT_DATABASE: &str = "postgres";

/// Default database user.
pub const DEFAULT_USER: &str = "postgres";

// =============================================================================
// Timeout Constants
// =============================================================================

/// Default connection (pool acquire) timeout in seconds.
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Default idle connection timeout in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Default connection timeout as Duration.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS);

/// Default query timeout as Duration.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS);

/// Default idle timeout as Duration.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS);

// =============================================================================
// Connection Pool Constants
// =============================================================================

/// Default minimum connections in pool.
pub const DEFAULT_MIN_CONNECTIONS: u32 = 0;

/// Default maximum connections in pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// =============================================================================
// Result Size Constants
// =============================================================================

/// Default row limit for `fetch_survey_data` when the caller omits one.
pub const DEFAULT_FETCH_LIMIT: u32 = 100;

/// Default row limit for `search_surveys_by_question` when the caller omits one.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Hard cap on rows returned by any single tool call.
pub const DEFAULT_MAX_LIMIT: u32 = 1000;

// =============================================================================
// Shutdown Constants
// =============================================================================

/// Default shutdown drain timeout in seconds.
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 30;

/// Default shutdown force timeout in seconds.
pub const DEFAULT_FORCE_TIMEOUT_SECS: u64 = 10;

/// Default shutdown drain timeout as Duration.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS);

/// Default shutdown force timeout as Duration.
pub const DEFAULT_FORCE_TIMEOUT: Duration = Duration::from_secs(DEFAULT_FORCE_TIMEOUT_SECS);

/// Sleep interval during drain phase.
pub const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(500);

// =============================================================================
// Resource URIs
// =============================================================================

/// Overall survey statistics.
pub const STATISTICS_URI: &str = "alloydb://surveys/statistics";

/// Distinct survey locations.
pub const LOCATIONS_URI: &str = "alloydb://surveys/locations";

/// Distinct respondent types.
pub const RESPONDENT_TYPES_URI: &str = "alloydb://surveys/respondent-types";

// =============================================================================
// Logging Constants
// =============================================================================

/// Default tracing filter when neither `RUST_LOG` nor `LOG_LEVEL` is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Truncation length for user-supplied text in logs.
pub const LOG_TEXT_TRUNCATE_LENGTH: usize = 100;
