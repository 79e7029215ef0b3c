//! Database connectivity and survey queries.

mod connection;
mod query;
pub mod types;

pub use connection::{create_lazy_pool, create_pool, pool_status, ConnectionPool, PoolStatus};
pub use query::SurveyQueries;
pub use types::{
    QuestionId, QuestionResponse, QuestionsPayload, SurveyFilter, SurveyRecord, SurveySearch,
    SurveyStatistics, SurveySummary, ValueCount,
};
