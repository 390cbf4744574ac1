use crate::error::LauncherError;
use crate::logs::{LineFilter, LogFollower, latest_log, open_in_viewer};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKey {
    Enter,
    Open,
    Filter,
    Other,
}

impl MenuKey {
    pub fn from_char(ch: char) -> Self {
        match ch.to_ascii_lowercase() {
            'r' => MenuKey::Open,
            'p' => MenuKey::Filter,
            '\n' | '\r' => MenuKey::Enter,
            _ => MenuKey::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Waiting,
    Opening,
    Filtering,
    Done,
}

impl MenuState {
    pub fn on_key(self, key: MenuKey) -> Self {
        match (self, key) {
            (MenuState::Waiting, MenuKey::Enter) => MenuState::Done,
            (MenuState::Waiting, MenuKey::Open) => MenuState::Opening,
            (MenuState::Waiting, MenuKey::Filter) => MenuState::Filtering,
            (state, _) => state,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MenuState::Done | MenuState::Filtering)
    }
}

pub trait KeySource {
    fn next_key(&mut self) -> Result<MenuKey>;
}

/// Single keypresses from the terminal in raw mode.
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> Result<MenuKey> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let key = read_key();
        disable_raw_mode().context("failed to disable raw mode")?;
        key
    }
}

fn read_key() -> Result<MenuKey> {
    loop {
        let Event::Key(key) = event::read().context("failed to read key")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        return Ok(match key.code {
            KeyCode::Enter => MenuKey::Enter,
            // Raw mode swallows the interrupt; treat it as leaving the menu.
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => MenuKey::Enter,
            KeyCode::Char(ch) => MenuKey::from_char(ch),
            _ => MenuKey::Other,
        });
    }
}

/// What the menu does on entering `Opening` or `Filtering`.
pub trait MenuActions {
    fn open_log(&mut self) -> Result<()>;
    fn filter_log(&mut self) -> Result<()>;
}

/// Acts on the newest RPT in the server's profiles directory.
pub struct RptActions<R, W> {
    profiles: PathBuf,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> RptActions<R, W> {
    pub fn new(profiles: &Path, input: R, output: W) -> Self {
        Self {
            profiles: profiles.to_path_buf(),
            input,
            output,
        }
    }
}

impl<R: BufRead, W: Write> MenuActions for RptActions<R, W> {
    fn open_log(&mut self) -> Result<()> {
        let path = latest_log(&self.profiles)?;
        writeln!(self.output, "opening {}", path.display())?;
        open_in_viewer(&path)
    }

    fn filter_log(&mut self) -> Result<()> {
        let path = latest_log(&self.profiles)?;
        write!(self.output, "search pattern (blank for all): ")?;
        self.output.flush()?;
        let mut pattern = String::new();
        self.input
            .read_line(&mut pattern)
            .context("failed to read search pattern")?;
        let filter = LineFilter::new(&pattern)?;

        writeln!(self.output, "following {} (Ctrl+C to stop)", path.display())?;
        LogFollower::new(path, filter).follow(&mut self.output)
    }
}

pub fn run_exit_menu<K, A, W>(keys: &mut K, actions: &mut A, out: &mut W) -> Result<MenuState>
where
    K: KeySource,
    A: MenuActions,
    W: Write,
{
    let mut state = MenuState::Waiting;
    writeln!(out, "[Enter] exit  [R] open RPT log  [P] filter RPT log")?;
    out.flush()?;
    while state == MenuState::Waiting {
        state = state.on_key(keys.next_key()?);
        match state {
            MenuState::Opening => {
                report_missing_log(actions.open_log())?;
                state = MenuState::Done;
            }
            MenuState::Filtering => {
                report_missing_log(actions.filter_log())?;
            }
            MenuState::Waiting | MenuState::Done => {}
        }
    }
    Ok(state)
}

fn report_missing_log(result: Result<()>) -> Result<()> {
    match result {
        Err(err)
            if matches!(
                err.downcast_ref::<LauncherError>(),
                Some(LauncherError::NoLogFound { .. })
            ) =>
        {
            warn!("{err}");
            Ok(())
        }
        other => other,
    }
}

/// Exit menu bound to the console.
pub fn run_console_menu(profiles: &Path) -> Result<MenuState> {
    let stdin = io::stdin();
    let mut actions = RptActions::new(profiles, stdin.lock(), io::stdout());
    run_exit_menu(&mut TerminalKeys, &mut actions, &mut io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedKeys(VecDeque<MenuKey>);

    impl KeySource for ScriptedKeys {
        fn next_key(&mut self) -> Result<MenuKey> {
            self.0.pop_front().context("script exhausted")
        }
    }

    #[derive(Default)]
    struct Recorder {
        opened: usize,
        filtered: usize,
        missing_log: bool,
    }

    impl MenuActions for Recorder {
        fn open_log(&mut self) -> Result<()> {
            self.opened += 1;
            if self.missing_log {
                return Err(LauncherError::NoLogFound { dir: PathBuf::from("profiles") }.into());
            }
            Ok(())
        }

        fn filter_log(&mut self) -> Result<()> {
            self.filtered += 1;
            Ok(())
        }
    }

    fn run(keys: &[MenuKey], actions: &mut Recorder) -> Result<MenuState> {
        let mut keys = ScriptedKeys(keys.iter().copied().collect());
        run_exit_menu(&mut keys, actions, &mut Vec::new())
    }

    #[test]
    fn transitions_from_waiting() {
        let waiting = MenuState::Waiting;
        assert_eq!(waiting.on_key(MenuKey::Enter), MenuState::Done);
        assert_eq!(waiting.on_key(MenuKey::Open), MenuState::Opening);
        assert_eq!(waiting.on_key(MenuKey::Filter), MenuState::Filtering);
        assert_eq!(waiting.on_key(MenuKey::Other), MenuState::Waiting);
        assert_eq!(MenuState::Done.on_key(MenuKey::Open), MenuState::Done);
        assert!(MenuState::Filtering.is_terminal());
        assert!(!MenuState::Opening.is_terminal());
    }

    #[test]
    fn keys_map_case_insensitively() {
        assert_eq!(MenuKey::from_char('R'), MenuKey::Open);
        assert_eq!(MenuKey::from_char('p'), MenuKey::Filter);
        assert_eq!(MenuKey::from_char('\r'), MenuKey::Enter);
        assert_eq!(MenuKey::from_char('x'), MenuKey::Other);
    }

    #[test]
    fn enter_exits_without_actions() {
        let mut actions = Recorder::default();
        let state = run(&[MenuKey::Other, MenuKey::Enter], &mut actions).unwrap();
        assert_eq!(state, MenuState::Done);
        assert_eq!(actions.opened, 0);
        assert_eq!(actions.filtered, 0);
    }

    #[test]
    fn open_runs_once_then_done() {
        let mut actions = Recorder::default();
        let state = run(&[MenuKey::Open], &mut actions).unwrap();
        assert_eq!(state, MenuState::Done);
        assert_eq!(actions.opened, 1);
    }

    #[test]
    fn filter_is_terminal() {
        let mut actions = Recorder::default();
        let state = run(&[MenuKey::Filter], &mut actions).unwrap();
        assert_eq!(state, MenuState::Filtering);
        assert_eq!(actions.filtered, 1);
    }

    #[test]
    fn missing_log_does_not_fail_menu() {
        let mut actions = Recorder {
            missing_log: true,
            ..Recorder::default()
        };
        assert_eq!(run(&[MenuKey::Open], &mut actions).unwrap(), MenuState::Done);
    }

    #[test]
    fn filter_without_rpt_reports_no_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut actions = RptActions::new(dir.path(), &b"error\n"[..], Vec::new());
        let err = actions.filter_log().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LauncherError>(),
            Some(LauncherError::NoLogFound { .. })
        ));
    }
}
