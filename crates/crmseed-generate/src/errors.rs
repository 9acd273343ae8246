use thiserror::Error;

/// Errors emitted by the generation engine.
///
/// Malformed bounds never surface here; they degrade to NULL columns.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Store(#[from] crmseed_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
