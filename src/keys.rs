use crate::paths::mod_link;
use crate::util::{CollisionNamer, has_extension};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const KEY_EXTENSION: &str = "bikey";

/// Base game keys that are never purged.
pub const BASE_KEYS: [&str; 3] = ["a3.bikey", "a3c.bikey", "gm.bikey"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedKey {
    pub mod_name: String,
    pub source: PathBuf,
    pub dest: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCopyReport {
    pub copied: Vec<CopiedKey>,
    pub missing: Vec<String>,
}

pub fn is_base_key(file_name: &str) -> bool {
    BASE_KEYS
        .iter()
        .any(|base| base.eq_ignore_ascii_case(file_name))
}

/// Deletes every file in `keys_dir` except the base game keys.
pub fn purge_keys(keys_dir: &Path) -> Result<usize> {
    if !keys_dir.is_dir() {
        return Ok(0);
    }
    let mut stale = Vec::new();
    for entry in fs::read_dir(keys_dir)
        .with_context(|| format!("failed to read keys dir: {}", keys_dir.display()))?
    {
        let entry = entry.context("failed to read keys dir entry")?;
        let file_type = entry.file_type().context("failed to read entry type")?;
        // Links are removed themselves, never their targets.
        if !file_type.is_file() && !file_type.is_symlink() {
            continue;
        }
        if is_base_key(&entry.file_name().to_string_lossy()) {
            continue;
        }
        stale.push(entry.path());
    }
    if stale.is_empty() {
        return Ok(0);
    }

    for path in &stale {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove key: {}", path.display()))?;
        debug!("removed key {}", path.display());
    }
    info!("purged {} key(s) from {}", stale.len(), keys_dir.display());
    Ok(stale.len())
}

/// First key file (in path order) anywhere under `dir`.
pub fn find_key(dir: &Path) -> Option<PathBuf> {
    let mut keys: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), KEY_EXTENSION))
        .map(|entry| entry.into_path())
        .collect();
    keys.sort();
    if keys.len() > 1 {
        debug!(
            "{} keys under {}, using {}",
            keys.len(),
            dir.display(),
            keys[0].display()
        );
    }
    keys.into_iter().next()
}

/// Copies each mod's key into `keys_dir`, renaming on collision.
pub fn copy_keys(root: &Path, mods: &[String], keys_dir: &Path) -> Result<KeyCopyReport> {
    let mut report = KeyCopyReport::default();
    if mods.is_empty() {
        return Ok(report);
    }
    fs::create_dir_all(keys_dir)
        .with_context(|| format!("failed to create keys dir: {}", keys_dir.display()))?;

    let mut namer = CollisionNamer::new();
    for name in mods {
        let Some(source) = find_key(&mod_link(root, name)) else {
            warn!("no key file found for mod {name}");
            report.missing.push(name.clone());
            continue;
        };
        let file_name = source
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .with_context(|| format!("key has no file name: {}", source.display()))?;
        let dest = namer.unique_path(keys_dir, &file_name);
        fs::copy(&source, &dest).with_context(|| {
            format!("failed to copy {} to {}", source.display(), dest.display())
        })?;
        debug!("copied key {} -> {}", source.display(), dest.display());
        report.copied.push(CopiedKey {
            mod_name: name.clone(),
            source,
            dest,
        });
    }
    info!(
        "copied {} key(s), {} mod(s) without a key",
        report.copied.len(),
        report.missing.len()
    );
    Ok(report)
}
