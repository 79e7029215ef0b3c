//! Tool input types with JSON Schema generation.

use crate::database::{SurveyFilter, SurveySearch};
use crate::error::ServerError;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Accepted date format for date filters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input for the `fetch_survey_data` tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FetchSurveyDataInput {
    /// Exact survey identifier.
    #[serde(default)]
    #[schemars(description = "Specific survey ID to fetch")]
    pub survey_id: Option<i64>,

    /// Case-insensitive substring of the location.
    #[serde(default)]
    #[schemars(description = "Filter by location (case-insensitive partial match)")]
    pub location: Option<String>,

    #[serde(default)]
    #[schemars(description = "Start date filter, inclusive (YYYY-MM-DD)")]
    pub date_from: Option<String>,

    #[serde(default)]
    #[schemars(description = "End date filter, inclusive (YYYY-MM-DD)")]
    pub date_to: Option<String>,

    /// Exact respondent type.
    #[serde(default)]
    #[schemars(description = "Filter by respondent type (exact match)")]
    pub respondent_type: Option<String>,

    #[serde(default)]
    #[schemars(description = "Maximum number of records to return (default: 100, max: 1000)")]
    pub limit: Option<u32>,
}

impl FetchSurveyDataInput {
    /// Validate the input and turn it into a query filter.
    ///
    /// `limit` must already be resolved against the server's defaults.
    pub fn to_filter(&self, limit: u32) -> Result<SurveyFilter, ServerError> {
        let date_from = parse_date("date_from", self.date_from.as_deref())?;
        let date_to = parse_date("date_to", self.date_to.as_deref())?;

        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(ServerError::invalid_input(format!(
                    "date_from ({}) must not be after date_to ({})",
                    from, to
                )));
            }
        }

        Ok(SurveyFilter {
            survey_id: self.survey_id,
            location: non_blank(self.location.as_deref()),
            date_from,
            date_to,
            respondent_type: non_blank(self.respondent_type.as_deref()),
            limit,
        })
    }
}

/// Input for the `search_surveys_by_question` tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchSurveysInput {
    #[serde(default)]
    #[schemars(description = "Text to search for in survey questions (case-insensitive)")]
    pub question_text: Option<String>,

    #[serde(default)]
    #[schemars(description = "Text to search for in survey responses (case-insensitive)")]
    pub response_text: Option<String>,

    #[serde(default)]
    #[schemars(description = "Maximum number of results to return (default: 50, max: 1000)")]
    pub limit: Option<u32>,
}

impl SearchSurveysInput {
    /// Turn the input into a search. Blank text is rejected by the query layer.
    pub fn to_search(&self, limit: u32) -> SurveySearch {
        SurveySearch {
            question_text: self.question_text.clone(),
            response_text: self.response_text.clone(),
            limit,
        }
    }
}

/// Parse an optional `YYYY-MM-DD` date argument.
pub fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ServerError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                ServerError::invalid_input(format!("{} must be YYYY-MM-DD, got '{}'", field, raw))
            }),
    }
}

/// Empty strings mean "no filter".
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
