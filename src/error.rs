//! Error types for the solver.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    /// Not enough cities to form a meaningful cycle.
    #[error("Degenerate input: {found} cities supplied, at least {required} required")]
    DegenerateInput { found: usize, required: usize },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SolverError {
    pub(crate) fn invalid_config(field: &str, value: impl ToString) -> Self {
        SolverError::InvalidConfig {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

pub type SolverResult<T> = Result<T, SolverError>;
