//! ServerHandler implementation for the AlloyDB Survey MCP Server.
//!
//! This module implements the rmcp `ServerHandler` trait which defines how
//! the server responds to MCP protocol requests.

use crate::resources::{build_resource_list, read_resource};
use crate::server::SurveyMcpServer;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    Implementation, ListResourcesResult, PaginatedRequestParam, ProtocolVersion,
    ReadResourceRequestParam, ReadResourceResult, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{tool_handler, ErrorData};
use tracing::info;

/// The `#[tool_handler]` macro wires up tool routing automatically.
/// It generates the `list_tools` and `call_tool` method implementations.
#[tool_handler]
impl ServerHandler for SurveyMcpServer {
    /// Server identification, called during the initialization handshake.
    fn get_info(&self) -> ServerInfo {
        info!("MCP client requesting server info");

        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,

            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),

            server_info: Implementation {
                name: self.config.server.name.clone(),
                title: Some("AlloyDB Survey MCP Server".to_string()),
                version: self.config.server.version.clone(),
                icons: None,
                website_url: None,
            },

            instructions: Some(build_instructions(self)),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult::with_all_items(build_resource_list()))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        read_resource(self, &request.uri).await.map_err(ErrorData::from)
    }
}

/// Build server instructions for the connected client.
fn build_instructions(server: &SurveyMcpServer) -> String {
    let mut instructions = String::new();

    instructions.push_str("# AlloyDB Survey MCP Server\n\n");
    instructions.push_str(&format!(
        "Read-only access to survey data on AlloyDB instance `{}`.\n\n",
        server.config.database.instance_connection_name()
    ));

    instructions.push_str("### Tools\n");
    instructions.push_str(
        "- `fetch_survey_data`: filter by survey_id, location (partial, case-insensitive), \
         date_from/date_to (YYYY-MM-DD, inclusive) and respondent_type (exact)\n",
    );
    instructions.push_str("- `get_survey_summary`: totals, date range and per-value counts\n");
    instructions.push_str(
        "- `search_surveys_by_question`: substring search over question and response text\n\n",
    );

    instructions.push_str("### Resources\n");
    instructions.push_str("- `alloydb://surveys/statistics`\n");
    instructions.push_str("- `alloydb://surveys/locations`\n");
    instructions.push_str("- `alloydb://surveys/respondent-types`\n\n");

    instructions.push_str(&format!(
        "Results are newest first. Default limits are {} rows for fetches and {} for searches; \
         no call returns more than {}.\n",
        server.config.query.default_limit,
        server.config.query.search_default_limit,
        server.config.query.max_limit
    ));

    instructions
}
