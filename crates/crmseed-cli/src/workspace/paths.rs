use std::path::{Path, PathBuf};

use super::{WorkspaceError, WorkspaceResult};

/// Directory layout of a crmseed workspace.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub runs_dir: PathBuf,
    pub out_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: PathBuf) -> Self {
        let config_dir = root.join("config");
        let data_dir = root.join("data");
        let runs_dir = root.join("runs");
        let out_dir = root.join("out");
        let logs_dir = root.join("logs");
        Self {
            root,
            config_dir,
            data_dir,
            runs_dir,
            out_dir,
            logs_dir,
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.toml")
    }

    pub fn cli_log_path(&self) -> PathBuf {
        self.logs_dir.join("cli.log")
    }

    /// Relative paths are taken from the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn ensure_dirs(&self) -> WorkspaceResult<()> {
        create_if_missing(&self.root)?;
        create_if_missing(&self.config_dir)?;
        create_if_missing(&self.data_dir)?;
        create_if_missing(&self.runs_dir)?;
        create_if_missing(&self.out_dir)?;
        create_if_missing(&self.logs_dir)?;
        Ok(())
    }
}

fn create_if_missing(path: &Path) -> WorkspaceResult<()> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(WorkspaceError::from)
}
