use thiserror::Error;

/// Errors raised while reshaping a table
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A textual cell could not be decoded into a structured value
    #[error("column '{column}' row {row}: cannot decode '{text}': {reason}")]
    InputFormat {
        column: String,
        row: usize,
        text: String,
        reason: String,
    },
    /// A cell does not have the shape the stage expects
    #[error("column '{column}' row {row}: {details}")]
    Schema {
        column: String,
        row: usize,
        details: String,
    },
    #[error("column '{0}' not found")]
    MissingColumn(String),
    #[error("lookup key '{0}' appears more than once")]
    DuplicateLookupKey(String),
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;
