use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("invalid launcher config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("no presets found in {dir}")]
    NoPresetsFound { dir: PathBuf },

    #[error("preset not found: {name} (available: {available})")]
    InvalidPresetName { name: String, available: String },

    #[error("broken mod link {link}: target {target} does not exist")]
    BrokenSymlink { link: PathBuf, target: PathBuf },

    #[error("no RPT log found in {dir}")]
    NoLogFound { dir: PathBuf },
}

impl LauncherError {
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
