use thiserror::Error;

use crate::models::ScoringScheme;
use crate::modes::AnalysisMode;

#[derive(Error, Debug)]
pub enum FobError {
    #[error("scoring scheme {scheme} is not supported for mode {mode}")]
    UnsupportedScheme {
        mode: AnalysisMode,
        scheme: ScoringScheme,
    },

    #[error("observation '{observation}' does not belong to mode {mode}")]
    UnknownObservation {
        mode: AnalysisMode,
        observation: String,
    },

    #[error("invalid time-point '{value}' for mode {mode}")]
    InvalidTimePoint { mode: AnalysisMode, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("duplicate cell for '{observation}' at time-point {time}")]
    DuplicateCell { observation: String, time: String },

    #[error("malformed worksheet: {0}")]
    Worksheet(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FobError>;
