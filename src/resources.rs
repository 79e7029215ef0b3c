//! MCP Resources for survey data.
//!
//! Resources provide passive read-only snapshots of the survey table. Following
//! MCP semantics, resources are like GET endpoints and take no arguments.
//!
//! ## URI Scheme
//!
//! - `alloydb://surveys/statistics` - Whole-table statistics
//! - `alloydb://surveys/locations` - Distinct survey locations
//! - `alloydb://surveys/respondent-types` - Distinct respondent types

use crate::constants::{LOCATIONS_URI, RESPONDENT_TYPES_URI, STATISTICS_URI};
use crate::error::ServerError;
use crate::server::SurveyMcpServer;
use rmcp::model::{AnnotateAble, RawResource, ReadResourceResult, Resource, ResourceContents};
use serde_json::json;
use tracing::{debug, warn};

const JSON_MIME_TYPE: &str = "application/json";

/// Build the list of available resources.
pub fn build_resource_list() -> Vec<Resource> {
    vec![
        create_resource(
            STATISTICS_URI,
            "Survey Statistics",
            "Total surveys, distinct locations and respondent types, date range and average duration",
            JSON_MIME_TYPE,
        ),
        create_resource(
            LOCATIONS_URI,
            "Survey Locations",
            "Sorted list of distinct survey locations",
            JSON_MIME_TYPE,
        ),
        create_resource(
            RESPONDENT_TYPES_URI,
            "Respondent Types",
            "Sorted list of distinct respondent types",
            JSON_MIME_TYPE,
        ),
    ]
}

/// Parsed resource URI variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceUri {
    Statistics,
    Locations,
    RespondentTypes,
}

impl ResourceUri {
    fn parse(uri: &str) -> Result<Self, ServerError> {
        match uri.trim_end_matches('/') {
            STATISTICS_URI => Ok(Self::Statistics),
            LOCATIONS_URI => Ok(Self::Locations),
            RESPONDENT_TYPES_URI => Ok(Self::RespondentTypes),
            _ => Err(ServerError::resource_not_found(uri)),
        }
    }
}

/// Read a resource by URI.
pub async fn read_resource(
    server: &SurveyMcpServer,
    uri: &str,
) -> Result<ReadResourceResult, ServerError> {
    let parsed = ResourceUri::parse(uri)?;
    debug!("Reading resource {:?}", parsed);

    let result = match parsed {
        ResourceUri::Statistics => server
            .surveys()
            .statistics()
            .await
            .and_then(|stats| to_json_text(&stats)),
        ResourceUri::Locations => server
            .surveys()
            .distinct_locations()
            .await
            .and_then(|locations| to_json_text(&json!({ "locations": locations }))),
        ResourceUri::RespondentTypes => server
            .surveys()
            .distinct_respondent_types()
            .await
            .and_then(|types| to_json_text(&json!({ "respondent_types": types }))),
    };

    let content = result.map_err(|e| {
        warn!("Failed to read resource {}: {}", uri, e);
        e
    })?;

    Ok(ReadResourceResult {
        contents: vec![json_contents(uri, content)],
    })
}

/// Text contents tagged with the same MIME type the resource list advertises.
fn json_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(JSON_MIME_TYPE.to_string()),
        text,
        meta: None,
    }
}

fn to_json_text<T: serde::Serialize>(value: &T) -> Result<String, ServerError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ServerError::internal(format!("Failed to serialize resource: {}", e)))
}

/// Create a resource definition.
fn create_resource(uri: &str, name: &str, description: &str, mime_type: &str) -> Resource {
    let mut resource = RawResource::new(uri, name);
    resource.description = Some(description.to_string());
    resource.mime_type = Some(mime_type.to_string());
    resource.no_annotation()
}
