use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const WORKSHOP_DIR: &str = "!Workshop";
pub const KEYS_DIR: &str = "Keys";

/// Launcher home: where the default config and presets live.
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
    pub config: PathBuf,
    pub presets: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let mut home = if let Ok(value) = env::var("A3LAUNCH_HOME") {
            PathBuf::from(value)
        } else {
            let base = dirs::config_dir().context("could not determine config directory")?;
            base.join("a3launch")
        };
        if !home.is_absolute() {
            let cwd = env::current_dir().context("failed to read current directory")?;
            home = cwd.join(home);
        }
        Ok(Self::at(home))
    }

    pub fn at(home: PathBuf) -> Self {
        let config = home.join("config.json");
        let presets = home.join("presets");
        Self {
            home,
            config,
            presets,
        }
    }
}

/// Config file to load: explicit flag, then `A3LAUNCH_CONFIG`, then home.
///
/// The launcher home is only looked up when neither is given.
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match env::var("A3LAUNCH_CONFIG") {
        Ok(value) if !value.trim().is_empty() => Ok(PathBuf::from(value)),
        _ => Ok(Paths::new()?.config),
    }
}

pub fn workshop_dir(root: &Path) -> PathBuf {
    root.join(WORKSHOP_DIR)
}

/// `<root>/!Workshop/@<name>`
pub fn mod_link(root: &Path, name: &str) -> PathBuf {
    workshop_dir(root).join(format!("@{name}"))
}

pub fn keys_dir(root: &Path) -> PathBuf {
    root.join(KEYS_DIR)
}

/// Absolute form of `path`, resolving relative paths against `base`.
pub fn absolute_from(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
