//! Survey query construction and execution.
//!
//! Every caller-supplied value reaches PostgreSQL as a bound parameter. Query
//! text is assembled only from the fixed fragments in this module.

use crate::config::QueryConfig;
use crate::database::types::{
    SurveyFilter, SurveyRecord, SurveySearch, SurveyStatistics, SurveySummary, ValueCount,
};
use crate::database::ConnectionPool;
use crate::error::ServerError;
use crate::security::{contains_pattern, escape_clause, require_search_text};
use sqlx::{Postgres, QueryBuilder};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const SURVEY_COLUMNS: &str = "survey_id, respondent_id, survey_date, location, respondent_type, \
     questions_responses, metadata, created_at, updated_at";

const SURVEY_ORDER: &str = " ORDER BY survey_date DESC NULLS LAST, survey_id DESC";

const STATISTICS_SQL: &str = "SELECT \
     COUNT(*) AS total_surveys, \
     COUNT(DISTINCT location) AS unique_locations, \
     COUNT(DISTINCT respondent_type) AS unique_respondent_types, \
     MIN(survey_date) AS earliest_survey, \
     MAX(survey_date) AS latest_survey, \
     COUNT(DISTINCT survey_date) AS survey_days, \
     AVG(CASE WHEN jsonb_typeof(metadata -> 'duration_minutes') = 'number' \
         THEN (metadata ->> 'duration_minutes')::float8 END) AS average_duration_minutes \
     FROM surveys";

const RESPONDENT_TYPE_COUNTS_SQL: &str = "SELECT respondent_type AS value, COUNT(*) AS count \
     FROM surveys WHERE respondent_type IS NOT NULL \
     GROUP BY respondent_type ORDER BY 2 DESC, 1 ASC";

const LOCATION_COUNTS_SQL: &str = "SELECT location AS value, COUNT(*) AS count \
     FROM surveys WHERE location IS NOT NULL \
     GROUP BY location ORDER BY 2 DESC, 1 ASC";

const DISTINCT_LOCATIONS_SQL: &str =
    "SELECT DISTINCT location FROM surveys WHERE location IS NOT NULL ORDER BY location";

const DISTINCT_RESPONDENT_TYPES_SQL: &str = "SELECT DISTINCT respondent_type FROM surveys \
     WHERE respondent_type IS NOT NULL ORDER BY respondent_type";

/// Read-only queries against the `surveys` table.
pub struct SurveyQueries {
    pool: ConnectionPool,
    timeout: Duration,
    default_limit: u32,
    search_default_limit: u32,
    max_limit: u32,
}

impl SurveyQueries {
    /// Create a new query executor.
    pub fn new(pool: ConnectionPool, config: &QueryConfig) -> Self {
        Self {
            pool,
            timeout: config.timeout,
            default_limit: config.default_limit,
            search_default_limit: config.search_default_limit,
            max_limit: config.max_limit,
        }
    }

    /// Hard cap on rows per call.
    pub fn max_limit(&self) -> u32 {
        self.max_limit
    }

    /// Resolve a caller-requested fetch limit against the defaults and cap.
    pub fn fetch_limit(&self, requested: Option<u32>) -> Result<u32, ServerError> {
        resolve_limit(requested, self.default_limit, self.max_limit)
    }

    /// Resolve a caller-requested search limit against the defaults and cap.
    pub fn search_limit(&self, requested: Option<u32>) -> Result<u32, ServerError> {
        resolve_limit(requested, self.search_default_limit, self.max_limit)
    }

    /// Fetch surveys matching every present filter field, most recent first.
    pub async fn fetch(&self, filter: &SurveyFilter) -> Result<Vec<SurveyRecord>, ServerError> {
        let limit = filter.limit.min(self.max_limit).max(1);
        let mut builder = build_fetch_query(filter, limit);

        debug!(
            "Fetching surveys (filters: {:?}, limit: {})",
            filter.active_filters(),
            limit
        );

        let start = Instant::now();
        let rows = self
            .run("fetch", builder.build_query_as::<SurveyRecord>().fetch_all(&self.pool))
            .await?;

        debug!(
            "Fetch completed: {} rows in {} ms",
            rows.len(),
            start.elapsed().as_millis()
        );
        Ok(rows)
    }

    /// Search question/response payloads, most recent first.
    ///
    /// Fails with `InvalidInput` before touching the database when no search
    /// text is given or any given text is blank.
    pub async fn search(&self, search: &SurveySearch) -> Result<Vec<SurveyRecord>, ServerError> {
        let patterns = search_patterns(search)?;
        let limit = search.limit.min(self.max_limit).max(1);
        let mut builder = build_search_query(&patterns, limit);

        debug!("Searching surveys ({} terms, limit: {})", patterns.len(), limit);

        let start = Instant::now();
        let rows = self
            .run("search", builder.build_query_as::<SurveyRecord>().fetch_all(&self.pool))
            .await?;

        debug!(
            "Search completed: {} rows in {} ms",
            rows.len(),
            start.elapsed().as_millis()
        );
        Ok(rows)
    }

    /// Aggregate statistics and per-value counts over the whole table.
    pub async fn summarize(&self) -> Result<SurveySummary, ServerError> {
        let statistics = sqlx::query_as::<_, SurveyStatistics>(STATISTICS_SQL).fetch_one(&self.pool);
        let respondent_types =
            sqlx::query_as::<_, ValueCount>(RESPONDENT_TYPE_COUNTS_SQL).fetch_all(&self.pool);
        let locations = sqlx::query_as::<_, ValueCount>(LOCATION_COUNTS_SQL).fetch_all(&self.pool);

        let (statistics, respondent_types, locations) = self
            .run("summarize", async {
                tokio::try_join!(statistics, respondent_types, locations)
            })
            .await?;

        Ok(SurveySummary {
            statistics,
            respondent_types,
            locations,
        })
    }

    /// Aggregate statistics only.
    pub async fn statistics(&self) -> Result<SurveyStatistics, ServerError> {
        self.run(
            "statistics",
            sqlx::query_as::<_, SurveyStatistics>(STATISTICS_SQL).fetch_one(&self.pool),
        )
        .await
    }

    /// All distinct non-null locations, sorted.
    pub async fn distinct_locations(&self) -> Result<Vec<String>, ServerError> {
        self.run(
            "distinct_locations",
            sqlx::query_scalar::<_, String>(DISTINCT_LOCATIONS_SQL).fetch_all(&self.pool),
        )
        .await
    }

    /// All distinct non-null respondent types, sorted.
    pub async fn distinct_respondent_types(&self) -> Result<Vec<String>, ServerError> {
        self.run(
            "distinct_respondent_types",
            sqlx::query_scalar::<_, String>(DISTINCT_RESPONDENT_TYPES_SQL).fetch_all(&self.pool),
        )
        .await
    }

    /// Round-trip a trivial query.
    pub async fn health_check(&self) -> Result<(), ServerError> {
        self.run("health_check", sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }

    /// Drive a query future under the configured timeout.
    ///
    /// The pooled connection is owned by the future, so it is returned to the
    /// pool on completion, on error and when the timeout drops the future.
    async fn run<T, F>(&self, operation: &'static str, query: F) -> Result<T, ServerError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let err = ServerError::from(e);
                warn!("Survey query '{}' failed: {}", operation, err);
                Err(match err {
                    ServerError::Timeout { .. } => ServerError::timeout(self.timeout.as_secs()),
                    other => other,
                })
            }
            Err(_) => {
                warn!(
                    "Survey query '{}' timed out after {} ms",
                    operation,
                    self.timeout.as_millis()
                );
                Err(ServerError::timeout(self.timeout.as_secs()))
            }
        }
    }
}

/// Apply the default when absent and clamp to the hard cap.
fn resolve_limit(requested: Option<u32>, default: u32, max: u32) -> Result<u32, ServerError> {
    match requested {
        Some(0) => Err(ServerError::invalid_input("limit must be at least 1")),
        Some(n) => Ok(n.min(max)),
        None => Ok(default.min(max)),
    }
}

/// Build the filtered fetch statement.
fn build_fetch_query(filter: &SurveyFilter, limit: u32) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM surveys WHERE 1=1", SURVEY_COLUMNS));

    if let Some(survey_id) = filter.survey_id {
        builder.push(" AND survey_id = ").push_bind(survey_id);
    }

    if let Some(location) = &filter.location {
        builder
            .push(" AND location ILIKE ")
            .push_bind(contains_pattern(location))
            .push(escape_clause());
    }

    if let Some(date_from) = filter.date_from {
        builder.push(" AND survey_date >= ").push_bind(date_from);
    }

    if let Some(date_to) = filter.date_to {
        builder.push(" AND survey_date <= ").push_bind(date_to);
    }

    if let Some(respondent_type) = &filter.respondent_type {
        builder
            .push(" AND respondent_type = ")
            .push_bind(respondent_type.clone());
    }

    builder.push(SURVEY_ORDER);
    builder.push(" LIMIT ").push_bind(i64::from(limit));
    builder
}

/// Validate search input and turn it into ILIKE patterns.
fn search_patterns(search: &SurveySearch) -> Result<Vec<String>, ServerError> {
    let mut patterns = Vec::new();

    if let Some(text) = &search.question_text {
        patterns.push(contains_pattern(&require_search_text("question_text", text)?));
    }
    if let Some(text) = &search.response_text {
        patterns.push(contains_pattern(&require_search_text("response_text", text)?));
    }

    if patterns.is_empty() {
        return Err(ServerError::invalid_input(
            "At least one search parameter (question_text or response_text) is required",
        ));
    }

    Ok(patterns)
}

/// Build the payload search statement. Every pattern must match.
fn build_search_query(patterns: &[String], limit: u32) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM surveys WHERE ", SURVEY_COLUMNS));

    for (i, pattern) in patterns.iter().enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        builder
            .push("questions_responses::text ILIKE ")
            .push_bind(pattern.clone())
            .push(escape_clause());
    }

    builder.push(SURVEY_ORDER);
    builder.push(" LIMIT ").push_bind(i64::from(limit));
    builder
}
