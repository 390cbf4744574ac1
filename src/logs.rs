use crate::error::LauncherError;
use crate::util::has_extension;
use anyhow::{Context, Result, bail};
use regex::{Regex, RegexBuilder};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::debug;

pub const LOG_EXTENSION: &str = "rpt";
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Most recently modified RPT file in `profiles_dir`.
pub fn latest_log(profiles_dir: &Path) -> Result<PathBuf> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    if profiles_dir.is_dir() {
        for entry in fs::read_dir(profiles_dir)
            .with_context(|| format!("failed to read profiles dir: {}", profiles_dir.display()))?
        {
            let entry = entry.context("failed to read profiles dir entry")?;
            let path = entry.path();
            if !path.is_file() || !has_extension(&path, LOG_EXTENSION) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .with_context(|| format!("failed to read mtime: {}", path.display()))?;
            if newest.as_ref().is_none_or(|(time, _)| modified > *time) {
                newest = Some((modified, path));
            }
        }
    }
    newest.map(|(_, path)| path).ok_or_else(|| {
        LauncherError::NoLogFound {
            dir: profiles_dir.to_path_buf(),
        }
        .into()
    })
}

/// Hands `path` to the desktop's default viewer.
pub fn open_in_viewer(path: &Path) -> Result<()> {
    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    debug!("opening {} with {program}", path.display());
    let status = Command::new(program)
        .arg(path)
        .status()
        .with_context(|| format!("failed to run {program}"))?;
    // explorer reports 1 even when it opened the file.
    if !status.success() && program != "explorer" {
        bail!("{program} exited with status {status}");
    }
    Ok(())
}

/// Case-insensitive line filter; a blank pattern matches everything.
#[derive(Debug, Clone)]
pub struct LineFilter {
    regex: Option<Regex>,
}

impl LineFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Ok(Self { regex: None });
        }
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("invalid search pattern: {pattern}"))?;
        Ok(Self { regex: Some(regex) })
    }

    pub fn matches(&self, line: &str) -> bool {
        self.regex.as_ref().is_none_or(|regex| regex.is_match(line))
    }
}

/// Incremental reader over a growing log file.
pub struct LogFollower {
    path: PathBuf,
    filter: LineFilter,
    offset: u64,
    pending: Vec<u8>,
}

impl LogFollower {
    pub fn new(path: PathBuf, filter: LineFilter) -> Self {
        Self {
            path,
            filter,
            offset: 0,
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes newly completed matching lines. Returns how many were written.
    pub fn poll<W: Write>(&mut self, out: &mut W) -> Result<usize> {
        let mut file = File::open(&self.path)
            .with_context(|| format!("failed to open log: {}", self.path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("failed to stat log: {}", self.path.display()))?
            .len();
        if len < self.offset {
            debug!("{} was truncated, rereading", self.path.display());
            self.offset = 0;
            self.pending.clear();
        }
        if len == self.offset {
            return Ok(0);
        }

        file.seek(SeekFrom::Start(self.offset))
            .context("failed to seek log")?;
        let mut chunk = Vec::new();
        file.take(len - self.offset)
            .read_to_end(&mut chunk)
            .context("failed to read log")?;
        self.offset += chunk.len() as u64;
        self.pending.extend_from_slice(&chunk);

        let mut written = 0;
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\r', '\n']);
            if self.filter.matches(line) {
                writeln!(out, "{line}")?;
                written += 1;
            }
        }
        out.flush()?;
        Ok(written)
    }

    /// Polls forever; stops only when the process is interrupted.
    pub fn follow<W: Write>(&mut self, out: &mut W) -> Result<()> {
        loop {
            self.poll(out)?;
            thread::sleep(POLL_INTERVAL);
        }
    }
}
