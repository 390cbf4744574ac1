use crate::error::LauncherError;
use crate::paths::absolute_from;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Validated launcher settings. Every path is absolute and existed at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    pub root: PathBuf,
    pub executable: String,
    pub port: u16,
    pub profile_name: String,
    pub basic_config: PathBuf,
    pub server_config: PathBuf,
    pub profiles: PathBuf,
    pub presets: Option<PathBuf>,
}

impl LauncherConfig {
    pub fn executable_path(&self) -> PathBuf {
        self.root.join(&self.executable)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    root_path: Option<String>,
    #[serde(default)]
    executable: Option<String>,
    #[serde(default)]
    port: Option<Value>,
    #[serde(default)]
    profile_name: Option<String>,
    #[serde(default)]
    basic_config: Option<String>,
    #[serde(default)]
    server_config: Option<String>,
    #[serde(default)]
    profiles_path: Option<String>,
    #[serde(default)]
    presets_path: Option<String>,
}

pub fn load_config(path: &Path) -> Result<LauncherConfig> {
    if !path.is_file() {
        return Err(LauncherError::config(path, "file not found").into());
    }
    let data = fs::read_to_string(path)
        .map_err(|err| LauncherError::config(path, format!("failed to read: {err}")))?;
    let mut raw: RawConfig = serde_json::from_str(&data)
        .map_err(|err| LauncherError::config(path, format!("failed to parse JSON: {err}")))?;

    apply_env_overrides(path, &mut raw)?;

    let base = config_base(path)?;
    validate(path, &base, raw).map_err(Into::into)
}

/// Absolute directory of the config file; relative entries anchor on it.
fn config_base(path: &Path) -> Result<PathBuf> {
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    if parent.is_absolute() {
        return Ok(parent);
    }
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(cwd.join(parent))
}

fn apply_env_overrides(path: &Path, raw: &mut RawConfig) -> Result<(), LauncherError> {
    if let Some(value) = env_value("A3LAUNCH_ROOT") {
        raw.root_path = Some(value);
    }
    if let Some(value) = env_value("A3LAUNCH_PORT") {
        let port: u64 = value.trim().parse().map_err(|_| {
            LauncherError::config(path, format!("A3LAUNCH_PORT is not an integer: {value}"))
        })?;
        raw.port = Some(Value::from(port));
    }
    if let Some(value) = env_value("A3LAUNCH_PROFILE") {
        raw.profile_name = Some(value);
    }
    Ok(())
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn validate(path: &Path, base: &Path, raw: RawConfig) -> Result<LauncherConfig, LauncherError> {
    let root = required(path, "rootPath", raw.root_path)?;
    let root = absolute_from(base, Path::new(&root));
    if !root.is_dir() {
        return Err(LauncherError::config(
            path,
            format!("rootPath does not exist: {}", root.display()),
        ));
    }

    let executable = required(path, "executable", raw.executable)?;
    if !root.join(&executable).is_file() {
        return Err(LauncherError::config(
            path,
            format!("executable {executable} not found in {}", root.display()),
        ));
    }

    let port = parse_port(path, raw.port)?;
    let profile_name = required(path, "profileName", raw.profile_name)?;
    let basic_config = existing(path, &root, "basicConfig", raw.basic_config)?;
    let server_config = existing(path, &root, "serverConfig", raw.server_config)?;
    let profiles = existing(path, &root, "profilesPath", raw.profiles_path)?;
    let presets = raw
        .presets_path
        .filter(|value| !value.trim().is_empty())
        .map(|value| absolute_from(&root, Path::new(value.trim())));

    Ok(LauncherConfig {
        root,
        executable,
        port,
        profile_name,
        basic_config,
        server_config,
        profiles,
        presets,
    })
}

fn required(path: &Path, field: &str, value: Option<String>) -> Result<String, LauncherError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(LauncherError::config(path, format!("{field} is not set"))),
    }
}

fn existing(
    path: &Path,
    root: &Path,
    field: &str,
    value: Option<String>,
) -> Result<PathBuf, LauncherError> {
    let value = required(path, field, value)?;
    let resolved = absolute_from(root, Path::new(&value));
    if !resolved.exists() {
        return Err(LauncherError::config(
            path,
            format!("{field} does not exist: {}", resolved.display()),
        ));
    }
    Ok(resolved)
}

fn parse_port(path: &Path, value: Option<Value>) -> Result<u16, LauncherError> {
    let value = value.ok_or_else(|| LauncherError::config(path, "port is not set"))?;
    let port = value
        .as_u64()
        .ok_or_else(|| LauncherError::config(path, format!("port must be an integer, got {value}")))?;
    match u16::try_from(port) {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(LauncherError::config(
            path,
            format!("port out of range: {port}"),
        )),
    }
}
