//! Domain error types.
//!
//! Warm-up shortfalls, risk breaches and degenerate indicator values are not
//! errors: they surface as absent signals, the engine's risk latches and
//! invalid indicator points respectively.

/// Top-level error type for hybridtrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol} ({timeframe}): {reason}")]
    DataUnavailable {
        symbol: String,
        timeframe: String,
        reason: String,
    },

    #[error("insufficient data for {symbol} ({timeframe}): have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        timeframe: String,
        bars: usize,
        minimum: usize,
    },

    #[error("news feed unavailable: {reason}")]
    NewsFeedUnavailable { reason: String },

    #[error("order rejected for {symbol}: {reason}")]
    ExecutionFailure { symbol: String, reason: String },

    #[error("executor connection failed: {reason}")]
    ExecutorConnection { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) | TraderError::Json(_) => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::ExecutorConnection { .. } | TraderError::ExecutionFailure { .. } => 3,
            TraderError::NewsFeedUnavailable { .. } => 4,
            TraderError::DataUnavailable { .. } | TraderError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
