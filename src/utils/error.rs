use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankError {
    #[error("Unsupported aggregation type: {key} (available: {})", .available.join(", "))]
    UnsupportedAggregation { key: String, available: Vec<String> },

    #[error("Cannot aggregate an empty temperature series")]
    EmptyInput,

    #[error("Data source unavailable for city '{city_id}': {message}")]
    SourceUnavailable { city_id: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RankError {
    pub fn source_unavailable(city_id: impl Into<String>, message: impl Into<String>) -> Self {
        RankError::SourceUnavailable {
            city_id: city_id.into(),
            message: message.into(),
        }
    }

    /// Errors that only affect a single city and are recovered by dropping
    /// that city from the ranking.
    pub fn is_city_level(&self) -> bool {
        matches!(
            self,
            RankError::EmptyInput | RankError::SourceUnavailable { .. }
        )
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RankError::EmptyInput => ErrorSeverity::Low,
            RankError::SourceUnavailable { .. } => ErrorSeverity::Medium,
            RankError::UnsupportedAggregation { .. }
            | RankError::ConfigError { .. }
            | RankError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            RankError::IoError(_) | RankError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }
}

pub type Result<T> = std::result::Result<T, RankError>;
