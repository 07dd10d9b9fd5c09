//! Unified error type for the planner.
//!
//! Domain-specific errors (input validation, model build, solver, solution
//! validation) convert into [`PlanError`] for uniform handling at API
//! boundaries.

use thiserror::Error;

/// Unified error type for all planner operations.
#[derive(Error, Debug)]
pub enum PlanError {
    /// I/O errors (solve-file persistence, input loading)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Input-data errors (pre-solve): unknown references, negative
    /// quantities, inconsistent initial inventory
    #[error("Input error: {0}")]
    Input(String),

    /// Model-build errors: empty production set, missing labor day,
    /// zero-capacity truck
    #[error("Model error: {0}")]
    Model(String),

    /// Solver errors: infeasible, unbounded, backend failure
    #[error("Solver error: {0}")]
    Solver(String),

    /// Solution-extraction/validation errors
    #[error("Solution error: {0}")]
    Solution(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using PlanError.
pub type PlanResult<T> = Result<T, PlanError>;

impl From<anyhow::Error> for PlanError {
    fn from(err: anyhow::Error) -> Self {
        PlanError::Other(err.to_string())
    }
}

impl From<String> for PlanError {
    fn from(s: String) -> Self {
        PlanError::Other(s)
    }
}

impl From<&str> for PlanError {
    fn from(s: &str) -> Self {
        PlanError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::Parse(err.to_string())
    }
}
