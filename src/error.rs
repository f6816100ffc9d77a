use thiserror::Error;

/// Failures of the forecasting pipeline.
///
/// "No suitable match" and "team not found" are not errors: the odds
/// fetcher and the team resolver return `None` for those and the
/// orchestrator halts cleanly.
#[derive(Error, Debug)]
pub enum ForecastError {
    // Configuration errors
    #[error("Missing configuration: {0} is not set")]
    MissingConfig(&'static str),

    // Network errors
    #[error("Data source unavailable ({source_name}): {detail}")]
    DataSourceUnavailable {
        source_name: &'static str,
        detail: String,
    },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    // Model errors
    #[error("Lineup unavailable for fixture {fixture_id}: {reason}")]
    LineupUnavailable { fixture_id: u64, reason: String },

    #[error("Insufficient history: {rows} fixture rows, need at least {required}")]
    InsufficientHistory { rows: usize, required: usize },

    #[error("Regression fit failed: {0}")]
    Fit(String),
}

impl ForecastError {
    pub fn unavailable(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::DataSourceUnavailable {
            source_name,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
