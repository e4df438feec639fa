//! Error types for the blending simulator.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    /// Bed geometry or simulator option rejected at construction.
    #[error("invalid config '{key}' = {value}: {reason}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    /// A stacking call broke the input contract.
    #[error("invalid input '{field}' = {value}: {reason}")]
    InvalidInput {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("expected {expected} quality parameters, got {provided}")]
    ParameterCountMismatch { expected: usize, provided: usize },

    /// `stack` called after the bed has been reclaimed.
    #[error("bed already reclaimed, no further stacking allowed")]
    ReclaimStarted,

    #[error("reclaim speed must be positive and finite, got {0}")]
    InvalidReclaimSpeed(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("table error: {0}")]
    Csv(#[from] csv::Error),

    /// Table contents that parse but do not form a material series.
    #[error("malformed table: {0}")]
    Table(String),
}

impl SimError {
    pub fn invalid_config(key: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidConfig {
            key,
            value: value.to_string(),
            reason,
        }
    }

    pub fn invalid_input(field: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidInput {
            field,
            value: value.to_string(),
            reason,
        }
    }
}
