//! Error types for marga-plan

use thiserror::Error;

/// Planner error type.
///
/// Grid and geometry edge cases never surface here: out-of-bounds queries
/// and degenerate interpolation collapse into infinite costs so the search
/// loop stays uniform.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A planning operation was invoked before its preconditions held
    #[error("Invalid planner state: {0}")]
    InvalidState(&'static str),
}

impl From<toml::de::Error> for PlannerError {
    fn from(e: toml::de::Error) -> Self {
        PlannerError::Config(e.to_string())
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, PlannerError>;
