use chrono::NaiveDate;
use thiserror::Error;

/// Failure modes of a pipeline run.
///
/// Single-field parse failures (a sensor's install year, one radar sample)
/// never surface here; they degrade to an absent value at the record
/// boundary. Everything that can abort a batch or a run is enumerated.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An upstream service could not be reached at the transport level.
    #[error("failed to reach {service}: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// An upstream service answered with a non-success status.
    #[error("{service} request failed with status {status}: {body}")]
    UpstreamStatus {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// An upstream payload did not deserialize.
    #[error("failed to decode {service} payload: {source}")]
    MalformedPayload {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// An upstream payload deserialized but lacked required data.
    #[error("{service} payload is missing {what}")]
    IncompletePayload {
        service: &'static str,
        what: &'static str,
    },

    /// A day's hourly series was empty where samples are required.
    #[error("no hourly samples for {date}")]
    EmptyHours { date: NaiveDate },

    /// The forecast horizon is shorter than the requested day index.
    #[error("forecast horizon holds {got} day(s), at least {need} required")]
    MissingForecastDay { need: usize, got: usize },

    /// The sink rejected a batch. Not retried internally.
    #[error("insert into {table} failed: {source}")]
    Persist {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// One or more independent stages of a combined run failed.
    #[error("pipeline stages failed: {0}")]
    StagesFailed(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
