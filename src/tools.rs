//! MCP Tools for survey data.
//!
//! - `fetch_survey_data`: Fetch surveys with optional filters
//! - `get_survey_summary`: Whole-table statistics and value counts
//! - `search_surveys_by_question`: Free-text search over questions and responses
//!
//! Argument problems are reported as invalid-params protocol errors before any
//! query runs. Database failures come back as tool-execution errors carrying a
//! sanitized message, so the calling model can see and react to them.

mod inputs;

pub use inputs::*;

use crate::error::{McpError, ServerError};
use crate::server::SurveyMcpServer;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::{tool, tool_router};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

#[tool_router]
impl SurveyMcpServer {
    /// Fetch survey records matching the given filters.
    #[tool(
        name = "fetch_survey_data",
        description = "Fetch survey data from AlloyDB with optional filters. Location matching is case-insensitive and partial; respondent type matching is exact. Results are ordered by survey date, newest first."
    )]
    pub async fn fetch_survey_data(
        &self,
        Parameters(input): Parameters<FetchSurveyDataInput>,
    ) -> Result<CallToolResult, McpError> {
        let limit = self.surveys.fetch_limit(input.limit)?;
        let filter = input.to_filter(limit)?;

        info!(
            "fetch_survey_data (filters: {:?}, limit: {})",
            filter.active_filters(),
            limit
        );

        match self.surveys.fetch(&filter).await {
            Ok(surveys) => json_result(&json!({
                "count": surveys.len(),
                "limit": limit,
                "surveys": surveys,
            })),
            Err(e) => Ok(tool_failure(
                "fetch_survey_data",
                &describe_filters(&filter.active_filters()),
                &e,
            )),
        }
    }

    /// Summarize the whole survey table.
    #[tool(
        name = "get_survey_summary",
        description = "Get summary statistics of all survey data: totals, distinct locations and respondent types, date range, and per-value counts."
    )]
    pub async fn get_survey_summary(&self) -> Result<CallToolResult, McpError> {
        info!("get_survey_summary");

        match self.surveys.summarize().await {
            Ok(summary) => {
                debug!(
                    "Summary: {} surveys across {} locations",
                    summary.statistics.total_surveys, summary.statistics.unique_locations
                );
                json_result(&summary)
            }
            Err(e) => Ok(tool_failure("get_survey_summary", "no filters", &e)),
        }
    }

    /// Search question and response text.
    #[tool(
        name = "search_surveys_by_question",
        description = "Search surveys by question or response content (case-insensitive substring match). At least one of question_text or response_text is required; both must match when both are given."
    )]
    pub async fn search_surveys_by_question(
        &self,
        Parameters(input): Parameters<SearchSurveysInput>,
    ) -> Result<CallToolResult, McpError> {
        let limit = self.surveys.search_limit(input.limit)?;
        let search = input.to_search(limit);

        info!(
            "search_surveys_by_question (question: {:?}, response: {:?}, limit: {})",
            search.question_text.as_deref().map(|t| truncate_for_log(t, LOG_TRUNCATE)),
            search.response_text.as_deref().map(|t| truncate_for_log(t, LOG_TRUNCATE)),
            limit
        );

        match self.surveys.search(&search).await {
            Ok(matches) => json_result(&json!({
                "count": matches.len(),
                "limit": limit,
                "matching_surveys": matches,
            })),
            // Blank search text is the caller's mistake, not a database failure
            Err(e) if e.is_validation() => Err(e.into()),
            Err(e) => {
                let mut terms = Vec::new();
                if search.question_text.is_some() {
                    terms.push("question_text");
                }
                if search.response_text.is_some() {
                    terms.push("response_text");
                }
                Ok(tool_failure(
                    "search_surveys_by_question",
                    &describe_filters(&terms),
                    &e,
                ))
            }
        }
    }
}

/// Create the tool router for the server.
pub fn create_tool_router() -> ToolRouter<SurveyMcpServer> {
    SurveyMcpServer::tool_router()
}

const LOG_TRUNCATE: usize = crate::constants::LOG_TEXT_TRUNCATE_LENGTH;

/// Serialize a tool payload as pretty JSON text content.
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::from(ServerError::internal(format!(
            "Failed to serialize tool output: {}",
            e
        )))
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Build a tool-execution error for a failed database operation.
///
/// Full detail goes to the log; the caller only sees the sanitized message.
fn tool_failure(operation: &str, context: &str, error: &ServerError) -> CallToolResult {
    warn!("{} failed ({}): {}", operation, context, error);

    let mut message = format!(
        "{} failed ({}): {}",
        operation,
        context,
        error.sanitized_message()
    );
    if let Some(suggestion) = error.suggestion() {
        message.push_str(&format!("\nSuggestion: {}", suggestion));
    }
    if error.is_transient() {
        message.push_str("\nThis error is transient; retrying may succeed.");
    }

    CallToolResult::error(vec![Content::text(message)])
}

fn describe_filters(active: &[&str]) -> String {
    if active.is_empty() {
        "no filters".to_string()
    } else {
        format!("filters: {}", active.join(", "))
    }
}

/// Truncate a string for logging.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}
