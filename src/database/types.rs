//! Survey record, filter and summary types.
//!
//! Rows decode straight into these types with `sqlx::FromRow` and serialize to
//! the JSON returned by tools and resources.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A survey row from the `surveys` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SurveyRecord {
    pub survey_id: i64,
    pub respondent_id: String,
    pub survey_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub respondent_type: Option<String>,
    #[sqlx(json)]
    pub questions_responses: QuestionsPayload,
    pub metadata: Option<Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The question/response payload of a survey.
///
/// Well-formed payloads are an array of `{id, question, response}` objects.
/// Anything else ingested outside this server is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionsPayload {
    Entries(Vec<QuestionResponse>),
    Other(Value),
}

impl QuestionsPayload {
    /// Structured entries, if the payload has the expected shape.
    pub fn entries(&self) -> Option<&[QuestionResponse]> {
        match self {
            QuestionsPayload::Entries(entries) => Some(entries),
            QuestionsPayload::Other(_) => None,
        }
    }
}

/// One question and the respondent's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub id: QuestionId,
    pub question: String,
    pub response: String,
    /// Keys beyond the three known ones, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Question identifiers appear both as numbers and as strings in the wild.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(i64),
    Text(String),
}

/// Constraints for `fetch`. `None` means no constraint on that dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyFilter {
    pub survey_id: Option<i64>,
    pub location: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub respondent_type: Option<String>,
    pub limit: u32,
}

impl SurveyFilter {
    /// An unconstrained filter returning at most `limit` rows.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            survey_id: None,
            location: None,
            date_from: None,
            date_to: None,
            respondent_type: None,
            limit,
        }
    }

    /// Names of the constrained dimensions, for logs and error context.
    pub fn active_filters(&self) -> Vec<&'static str> {
        let mut active = Vec::new();
        if self.survey_id.is_some() {
            active.push("survey_id");
        }
        if self.location.is_some() {
            active.push("location");
        }
        if self.date_from.is_some() {
            active.push("date_from");
        }
        if self.date_to.is_some() {
            active.push("date_to");
        }
        if self.respondent_type.is_some() {
            active.push("respondent_type");
        }
        active
    }
}

/// Free-text search over the question/response payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveySearch {
    pub question_text: Option<String>,
    pub response_text: Option<String>,
    pub limit: u32,
}

impl SurveySearch {
    /// Search for `text` anywhere in the question payload.
    pub fn text(text: impl Into<String>, limit: u32) -> Self {
        Self {
            question_text: Some(text.into()),
            response_text: None,
            limit,
        }
    }
}

/// Whole-table aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SurveyStatistics {
    pub total_surveys: i64,
    pub unique_locations: i64,
    pub unique_respondent_types: i64,
    pub earliest_survey: Option<NaiveDate>,
    pub latest_survey: Option<NaiveDate>,
    pub survey_days: i64,
    /// Mean of numeric `metadata.duration_minutes`, when any record has one.
    pub average_duration_minutes: Option<f64>,
}

/// A distinct value and the number of records carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ValueCount {
    pub value: String,
    pub count: i64,
}

/// Result of `summarize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySummary {
    pub statistics: SurveyStatistics,
    pub respondent_types: Vec<ValueCount>,
    pub locations: Vec<ValueCount>,
}
