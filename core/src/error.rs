use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Input file not found: {path}")]
    InputNotFound { path: String },

    #[error("Malformed row at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AggResult<T> = Result<T, AggError>;
