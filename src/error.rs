//! Error types for the AlloyDB Survey MCP Server.
//!
//! This module defines semantic error types with PostgreSQL SQLSTATE mapping
//! and produces caller-safe messages that never echo driver text, query text
//! or credentials.

pub use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Domain-specific errors for the AlloyDB Survey MCP Server.
///
/// Named `ServerError` to avoid collision with `rmcp::ErrorData`.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection error
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Database not found
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    /// Table or column missing
    #[error("{object_type} not found: {name}")]
    ObjectNotFound { object_type: String, name: String },

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid tool or resource input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Query execution error
    #[error("Query execution error: {message}")]
    QueryExecution {
        message: String,
        sql_state: Option<String>,
    },

    /// Query timeout
    #[error("Query timeout: operation exceeded {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    /// Resource not found
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a connection error with a source.
    pub fn connection_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an authentication error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create an object not found error.
    pub fn object_not_found(object_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            object_type: object_type.into(),
            name: name.into(),
        }
    }

    /// Create a permission denied error.
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a query execution error.
    pub fn query_error(msg: impl Into<String>) -> Self {
        Self::QueryExecution {
            message: msg.into(),
            sql_state: None,
        }
    }

    /// Create a query execution error carrying its SQLSTATE.
    pub fn query_error_with_state(msg: impl Into<String>, sql_state: impl Into<String>) -> Self {
        Self::QueryExecution {
            message: msg.into(),
            sql_state: Some(sql_state.into()),
        }
    }

    /// Create a timeout error.
    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout {
            timeout_seconds: seconds,
        }
    }

    /// Create a resource not found error.
    pub fn resource_not_found(uri: impl Into<String>) -> Self {
        Self::ResourceNotFound(uri.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error is transient and may succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Timeout { .. } => true,
            Self::QueryExecution {
                sql_state: Some(state),
                ..
            } => is_transient_sql_state(state),
            _ => false,
        }
    }

    /// Check if this error was caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Message that is safe to hand back to an MCP client.
    ///
    /// Validation messages are built from the caller's own input and pass
    /// through unchanged. Everything else collapses to a fixed description so
    /// that driver text, SQL and connection strings stay in the server log.
    pub fn sanitized_message(&self) -> String {
        match self {
            Self::Config(_) => "Server configuration error".to_string(),
            Self::Connection { .. } => "Database is unreachable".to_string(),
            Self::Authentication(_) => "Database authentication failed".to_string(),
            Self::DatabaseNotFound(_) => "Configured database does not exist".to_string(),
            Self::ObjectNotFound { object_type, .. } => {
                format!("Required {} is missing from the survey schema", object_type.to_lowercase())
            }
            Self::PermissionDenied(_) => "Database user lacks permission for this query".to_string(),
            Self::InvalidInput(msg) => msg.clone(),
            Self::QueryExecution {
                sql_state: Some(state),
                ..
            } => format!("Query failed (SQLSTATE {})", state),
            Self::QueryExecution { sql_state: None, .. } => "Query failed".to_string(),
            Self::Timeout { timeout_seconds } => {
                format!("Query exceeded the {} second timeout", timeout_seconds)
            }
            Self::ResourceNotFound(uri) => format!("Unknown resource: {}", uri),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Get a user-friendly suggestion for how to fix this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Config(_) => Some("Check your environment variables and configuration"),
            Self::Connection { .. } => {
                Some("Check that the AlloyDB instance or Auth Proxy is reachable, then retry")
            }
            Self::Authentication(_) => Some("Verify ALLOYDB_USER and ALLOYDB_PASSWORD"),
            Self::DatabaseNotFound(_) => Some("Check ALLOYDB_DATABASE and ensure it exists"),
            Self::ObjectNotFound { .. } => {
                Some("Provision the surveys table with sql/schema.sql")
            }
            Self::PermissionDenied(_) => {
                Some("Grant SELECT on the surveys table to the configured user")
            }
            Self::InvalidInput(_) => Some("Review the tool arguments and their formats"),
            Self::Timeout { .. } => Some("Narrow the filters or lower the limit, then retry"),
            _ => None,
        }
    }
}

/// Map a PostgreSQL SQLSTATE to a semantic ServerError.
pub fn from_sql_state(state: &str, message: &str) -> ServerError {
    match state {
        // Invalid authorization specification / invalid password
        "28000" | "28P01" => ServerError::auth(message),

        // Invalid catalog name
        "3D000" => ServerError::DatabaseNotFound(message.to_string()),

        // Undefined table / column
        "42P01" => ServerError::object_not_found("Table", message),
        "42703" => ServerError::object_not_found("Column", message),

        // Insufficient privilege
        "42501" => ServerError::permission_denied(message),

        // Statement timeout / query canceled
        "57014" => ServerError::timeout(0),

        // Too many connections, admin shutdown, crash shutdown, cannot connect now
        "53300" | "57P01" | "57P02" | "57P03" => ServerError::connection(message),

        // Connection exception class
        s if s.starts_with("08") => ServerError::connection(message),

        _ => ServerError::query_error_with_state(message, state),
    }
}

/// Check if a SQLSTATE indicates a transient error.
fn is_transient_sql_state(state: &str) -> bool {
    matches!(
        state,
        "40001"     // Serialization failure
        | "40P01"   // Deadlock detected
        | "53300"   // Too many connections
        | "55P03"   // Lock not available
        | "57014"   // Query canceled
        | "57P01"   // Admin shutdown
    ) || state.starts_with("08")
}

/// Convert ServerError to rmcp's ErrorData for protocol responses.
///
/// Tool failures from the database should generally be returned as
/// `CallToolResult::error` instead. This conversion is used for argument
/// validation and resource reads.
impl From<ServerError> for McpError {
    fn from(e: ServerError) -> Self {
        match &e {
            ServerError::InvalidInput(_) => McpError::invalid_params(e.sanitized_message(), None),
            ServerError::ResourceNotFound(_) => {
                McpError::resource_not_found(e.sanitized_message(), None)
            }
            ServerError::Config(_) => McpError::invalid_request(e.sanitized_message(), None),
            _ => McpError::internal_error(e.sanitized_message(), None),
        }
    }
}

impl From<sqlx::Error> for ServerError {
    fn from(e: sqlx::Error) -> Self {
        use sqlx::Error;

        match &e {
            Error::Database(db) => match db.code() {
                Some(code) => from_sql_state(&code, db.message()),
                None => ServerError::query_error(db.message()),
            },
            Error::Io(_) => ServerError::connection(format!("IO error: {}", e)),
            Error::Tls(_) => ServerError::connection(format!("TLS error: {}", e)),
            Error::Protocol(_) => ServerError::connection(format!("Protocol error: {}", e)),
            Error::PoolTimedOut => ServerError::connection("Timed out acquiring a pooled connection"),
            Error::PoolClosed => ServerError::connection("Connection pool is closed"),
            Error::WorkerCrashed => ServerError::connection("Connection worker crashed"),
            Error::Configuration(_) => ServerError::config(e.to_string()),
            Error::ColumnNotFound(name) => ServerError::object_not_found("Column", name.clone()),
            Error::ColumnDecode { .. } | Error::Decode(_) => {
                ServerError::query_error(format!("Type conversion error: {}", e))
            }
            Error::RowNotFound => ServerError::query_error("No rows returned"),
            _ => ServerError::internal(e.to_string()),
        }
    }
}
