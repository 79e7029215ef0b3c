//! MCP server struct definition and initialization.

use crate::config::Config;
use crate::database::{create_lazy_pool, create_pool, ConnectionPool, SurveyQueries};
use crate::error::ServerError;
use rmcp::handler::server::router::tool::ToolRouter;
use std::sync::Arc;
use tracing::info;

/// The AlloyDB Survey MCP Server instance.
///
/// This struct is cloned for each request, but the inner state
/// is shared via Arc. The server provides:
///
/// - **Tools**: Survey fetch, summary and search
/// - **Resources**: Statistics, locations and respondent types
#[derive(Clone)]
pub struct SurveyMcpServer {
    /// Configuration.
    pub(crate) config: Arc<Config>,

    /// Database connection pool.
    pub(crate) pool: ConnectionPool,

    /// Survey data access.
    pub(crate) surveys: Arc<SurveyQueries>,

    /// Tool router for dispatching tool calls.
    pub(crate) tool_router: ToolRouter<Self>,
}

impl SurveyMcpServer {
    /// Create a new server instance with the given configuration.
    ///
    /// Creates the connection pool and runs a health check query.
    pub async fn new(config: Config) -> Result<Self, ServerError> {
        let pool = create_pool(&config.database, config.query.timeout).await?;
        let server = Self::with_pool(config, pool);
        server.surveys.health_check().await?;
        info!(
            "Survey server ready for {}",
            server.config.database.instance_connection_name()
        );
        Ok(server)
    }

    /// Create a server around an existing pool.
    pub fn with_pool(config: Config, pool: ConnectionPool) -> Self {
        let surveys = Arc::new(SurveyQueries::new(pool.clone(), &config.query));
        let tool_router = crate::tools::create_tool_router();

        Self {
            config: Arc::new(config),
            pool,
            surveys,
            tool_router,
        }
    }

    /// Create a server whose pool connects on first use.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_lazy_pool(config: Config) -> Self {
        let pool = create_lazy_pool(&config.database, config.query.timeout);
        Self::with_pool(config, pool)
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Get a reference to the survey queries.
    pub fn surveys(&self) -> &SurveyQueries {
        &self.surveys
    }
}
