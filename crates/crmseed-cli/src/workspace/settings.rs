use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crmseed_core::ColumnConventions;

use super::atomic::write_bytes_atomic;
use super::{WorkspaceError, WorkspacePaths, WorkspaceResult};

/// Contents of `config/settings.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    /// SQLite database file, relative to the workspace root unless absolute.
    pub db_path: PathBuf,
    pub default_rows: usize,
    /// Upper limit accepted for `--rows`.
    pub max_rows: usize,
    pub conventions: ColumnConventions,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/crm.sqlite"),
            default_rows: 100,
            max_rows: 100_000,
            conventions: ColumnConventions::default(),
        }
    }
}

pub fn load_or_create_settings(paths: &WorkspacePaths) -> WorkspaceResult<CliSettings> {
    let path = paths.settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        let settings: CliSettings = toml::from_str(&content)?;
        validate(&settings)?;
        return Ok(settings);
    }

    let settings = CliSettings::default();
    save_settings(paths, &settings)?;
    Ok(settings)
}

fn validate(settings: &CliSettings) -> WorkspaceResult<()> {
    if settings.max_rows == 0 {
        return Err(WorkspaceError::Invalid(
            "max_rows must be greater than zero".to_string(),
        ));
    }
    for format in &settings.conventions.identifiers {
        if format.digits == 0 {
            return Err(WorkspaceError::Invalid(format!(
                "identifier {} needs at least one digit",
                format.column
            )));
        }
        if format.default_min > format.default_max {
            return Err(WorkspaceError::Invalid(format!(
                "identifier {} has default_min {} above default_max {}",
                format.column, format.default_min, format.default_max
            )));
        }
    }
    Ok(())
}

pub fn save_settings(paths: &WorkspacePaths, settings: &CliSettings) -> WorkspaceResult<()> {
    let path = paths.settings_path();
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(&path, encoded.as_bytes())
}
