use super::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed for row {row}: {reason}")]
    Validation { row: usize, reason: String },

    #[error(
        "No coordinate correspondence for candidate '{candidate_id}' (reference has {reference_len} atoms, predicted has {predicted_len})"
    )]
    Correspondence {
        candidate_id: String,
        reference_len: usize,
        predicted_len: usize,
    },

    #[error("Non-finite coordinates for candidate '{candidate_id}'")]
    InvalidCoordinates { candidate_id: String },

    #[error("Candidate '{candidate_id}' has no scorable epitope-allele pairs")]
    UndefinedScore { candidate_id: String },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "validation",
            EngineError::Correspondence { .. } => "correspondence",
            EngineError::InvalidCoordinates { .. } => "invalid_coordinates",
            EngineError::UndefinedScore { .. } => "undefined_score",
            EngineError::Config { .. } => "config",
            EngineError::Internal(_) => "internal",
        }
    }
}
