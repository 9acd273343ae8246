use thiserror::Error;

/// Core error type shared across crmseed crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error or store failure.
    #[error("database error: {0}")]
    Db(String),
    /// The table schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Caller supplied unusable input (empty batch, unknown table).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Filesystem failure while importing or exporting data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by crmseed crates.
pub type Result<T> = std::result::Result<T, Error>;
