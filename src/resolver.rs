use crate::error::LauncherError;
use crate::paths::mod_link;
use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModFlag {
    Global,
    Server,
}

impl ModFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            ModFlag::Global => "-mod",
            ModFlag::Server => "-servermod",
        }
    }
}

impl fmt::Display for ModFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved mod directories for one launch flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModList {
    pub flag: ModFlag,
    pub paths: Vec<PathBuf>,
}

impl ResolvedModList {
    /// `p1;p2;` with every path terminated by a semicolon.
    pub fn joined(&self) -> String {
        let mut out = String::new();
        for path in &self.paths {
            out.push_str(&path.display().to_string());
            out.push(';');
        }
        out
    }
}

/// Resolves each mod's workshop link to its target directory.
///
/// Mods without a workshop folder are skipped with a warning. Returns `None`
/// when nothing resolved, so the caller leaves the flag off entirely.
pub fn resolve_mods(
    names: &[String],
    root: &Path,
    flag: ModFlag,
) -> Result<Option<ResolvedModList>> {
    let mut paths = Vec::with_capacity(names.len());
    for name in names {
        match resolve_mod(root, name)? {
            Some(path) => {
                debug!("{flag} {name} -> {}", path.display());
                paths.push(path);
            }
            None => warn!(
                "mod {name} has no workshop folder at {}, skipping",
                mod_link(root, name).display()
            ),
        }
    }
    if paths.is_empty() {
        return Ok(None);
    }
    Ok(Some(ResolvedModList { flag, paths }))
}

/// Target of `<root>/!Workshop/@<name>`, or `None` if the folder is absent.
pub fn resolve_mod(root: &Path, name: &str) -> Result<Option<PathBuf>> {
    let link = mod_link(root, name);
    let meta = match fs::symlink_metadata(&link) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to inspect mod folder: {}", link.display()));
        }
    };

    if !meta.file_type().is_symlink() {
        // Not a link (copied in place): use the folder as is.
        return Ok(Some(link));
    }

    let target = fs::read_link(&link)
        .with_context(|| format!("failed to read mod link: {}", link.display()))?;
    let target = strip_verbatim(target);
    let target = match link.parent() {
        Some(parent) if target.is_relative() => parent.join(target),
        _ => target,
    };
    if !target.exists() {
        return Err(LauncherError::BrokenSymlink { link, target }.into());
    }
    Ok(Some(target))
}

/// Drops the `\\?\` prefix Windows puts on junction targets; the server
/// does not accept verbatim paths in `-mod`.
pub fn strip_verbatim(path: PathBuf) -> PathBuf {
    match path.to_str().and_then(|text| text.strip_prefix(r"\\?\")) {
        // `\\?\UNC\host\share` is a network path, not a drive path.
        Some(rest) if !rest.starts_with(r"UNC\") => PathBuf::from(rest),
        _ => path,
    }
}
