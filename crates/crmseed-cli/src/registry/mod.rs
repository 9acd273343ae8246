mod logging;
mod run;

pub use logging::init_cli_logging;
pub use run::{RunContext, TableRun, TableStatus, start_run, write_report};

use thiserror::Error;

use crate::workspace::WorkspaceError;

/// Registry-level errors for run artifacts.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact write failed: {0}")]
    Artifact(#[from] WorkspaceError),
    #[error("logging error: {0}")]
    Logging(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
