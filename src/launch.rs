use crate::config::LauncherConfig;
use crate::resolver::ResolvedModList;
use anyhow::{Context, Result, bail};
use std::fmt;
use std::path::Path;
use std::process::Command;
#[cfg(not(windows))]
use std::process::Stdio;
use tracing::info;

/// One `-flag=value` server argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArg {
    pub flag: &'static str,
    pub value: String,
    pub quoted: bool,
}

impl LaunchArg {
    fn plain(flag: &'static str, value: impl Into<String>) -> Self {
        Self {
            flag,
            value: value.into(),
            quoted: false,
        }
    }

    fn path(flag: &'static str, path: &Path) -> Self {
        Self {
            flag,
            value: path.display().to_string(),
            quoted: true,
        }
    }

    fn mods(list: &ResolvedModList) -> Self {
        Self {
            flag: list.flag.as_str(),
            value: list.joined(),
            quoted: true,
        }
    }

    /// Form handed to a process without a shell in between.
    pub fn unquoted(&self) -> String {
        format!("{}={}", self.flag, self.value)
    }
}

impl fmt::Display for LaunchArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "{}=\"{}\"", self.flag, self.value)
        } else {
            write!(f, "{}={}", self.flag, self.value)
        }
    }
}

pub fn build_args(
    config: &LauncherConfig,
    global: Option<&ResolvedModList>,
    server: Option<&ResolvedModList>,
) -> Vec<LaunchArg> {
    let mut args = vec![
        LaunchArg::plain("-name", &config.profile_name),
        LaunchArg::plain("-port", config.port.to_string()),
        LaunchArg::path("-cfg", &config.basic_config),
        LaunchArg::path("-config", &config.server_config),
        LaunchArg::path("-profiles", &config.profiles),
    ];
    if let Some(list) = global {
        args.push(LaunchArg::mods(list));
    }
    if let Some(list) = server {
        args.push(LaunchArg::mods(list));
    }
    args
}

pub fn render_command_line(config: &LauncherConfig, args: &[LaunchArg]) -> String {
    let mut line = format!("\"{}\"", config.executable_path().display());
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string());
    }
    line
}

/// Starts the server without waiting for it. Returns the child's PID.
pub fn spawn_server(config: &LauncherConfig, args: &[LaunchArg]) -> Result<u32> {
    let exec = config.executable_path();
    if !exec.is_file() {
        bail!("server executable not found: {}", exec.display());
    }

    let mut command = Command::new(&exec);
    command.current_dir(&config.root);
    apply_args(&mut command, args);

    let child = command
        .spawn()
        .with_context(|| format!("failed to start {}", exec.display()))?;
    let pid = child.id();
    info!("started {} (pid {pid})", exec.display());
    Ok(pid)
}

#[cfg(windows)]
fn apply_args(command: &mut Command, args: &[LaunchArg]) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

    command.creation_flags(CREATE_NEW_CONSOLE);
    // The server parses its own command line; quotes must reach it untouched.
    for arg in args {
        command.raw_arg(arg.to_string());
    }
}

#[cfg(not(windows))]
fn apply_args(command: &mut Command, args: &[LaunchArg]) {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .args(args.iter().map(LaunchArg::unquoted));
}
