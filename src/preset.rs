use crate::error::LauncherError;
use crate::util::has_extension;
use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const PRESET_EXTENSION: &str = "txt";
const COMMENT_MARKER: char = '#';
const SERVER_MARKER: char = '$';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    /// 1-based, as shown in the selection prompt.
    pub index: usize,
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresetStats {
    pub global: usize,
    pub server: usize,
    pub skipped: usize,
}

/// Mods named by a preset, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModSet {
    pub global: Vec<String>,
    pub server: Vec<String>,
    pub stats: PresetStats,
}

impl ModSet {
    /// Global mods followed by server mods.
    pub fn all(&self) -> Vec<String> {
        self.global.iter().chain(&self.server).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.server.is_empty()
    }
}

pub fn list_presets(dir: &Path) -> Result<Vec<Preset>> {
    if !dir.is_dir() {
        return Err(LauncherError::NoPresetsFound {
            dir: dir.to_path_buf(),
        }
        .into());
    }
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read presets dir: {}", dir.display()))?
    {
        let entry = entry.context("failed to read presets dir entry")?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, PRESET_EXTENSION) {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(LauncherError::NoPresetsFound {
            dir: dir.to_path_buf(),
        }
        .into());
    }
    files.sort();

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(idx, path)| Preset {
            index: idx + 1,
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            path,
        })
        .collect())
}

pub fn select_by_name<'a>(presets: &'a [Preset], name: &str) -> Result<&'a Preset> {
    presets
        .iter()
        .find(|preset| preset.name == name)
        .ok_or_else(|| {
            let available = presets
                .iter()
                .map(|preset| preset.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            LauncherError::InvalidPresetName {
                name: name.to_string(),
                available,
            }
            .into()
        })
}

/// Auto-selects a lone preset, otherwise prompts until a valid index is entered.
pub fn select_interactive<'a, R, W>(
    presets: &'a [Preset],
    input: &mut R,
    output: &mut W,
) -> Result<&'a Preset>
where
    R: BufRead,
    W: Write,
{
    match presets {
        [] => bail!("no presets to choose from"),
        [only] => {
            writeln!(output, "only one preset found, using {}", only.name)?;
            return Ok(only);
        }
        _ => {}
    }

    for preset in presets {
        writeln!(output, "  [{}] {}", preset.index, preset.name)?;
    }
    loop {
        write!(output, "select preset (1-{}): ", presets.len())?;
        output.flush()?;

        let mut line = String::new();
        let read = input.read_line(&mut line).context("failed to read selection")?;
        if read == 0 {
            bail!("no preset selected (input closed)");
        }
        match line.trim().parse::<usize>() {
            Ok(idx) if (1..=presets.len()).contains(&idx) => return Ok(&presets[idx - 1]),
            Ok(idx) => writeln!(output, "{idx} is out of range")?,
            Err(_) => writeln!(output, "enter a number")?,
        }
    }
}

pub fn parse_preset(path: &Path) -> Result<ModSet> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read preset: {}", path.display()))?;
    let mods = parse_preset_str(&data);
    info!(
        global = mods.stats.global,
        server = mods.stats.server,
        skipped = mods.stats.skipped,
        "parsed preset {}",
        path.display()
    );
    Ok(mods)
}

pub fn parse_preset_str(data: &str) -> ModSet {
    let mut mods = ModSet::default();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with(COMMENT_MARKER) {
            mods.stats.skipped += 1;
        } else if let Some(rest) = line.strip_prefix(SERVER_MARKER) {
            let name = rest.trim();
            if name.is_empty() {
                mods.stats.skipped += 1;
            } else {
                mods.server.push(name.to_string());
            }
        } else {
            mods.global.push(line.to_string());
        }
    }
    mods.stats.global = mods.global.len();
    mods.stats.server = mods.server.len();
    mods
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn presets_in(dir: &Path, names: &[&str]) -> Vec<Preset> {
        for name in names {
            fs::write(dir.join(name), b"CBA_A3\n").unwrap();
        }
        list_presets(dir).unwrap()
    }

    #[test]
    fn classifies_comments_server_and_global_lines() {
        let mods = parse_preset_str("#comment\n\nCBA_A3\n$ace_server\n");
        assert_eq!(mods.global, vec!["CBA_A3"]);
        assert_eq!(mods.server, vec!["ace_server"]);
        assert_eq!(mods.stats.skipped, 1);
        assert_eq!(mods.stats.global, 1);
        assert_eq!(mods.stats.server, 1);
    }

    #[test]
    fn server_marker_and_padding_are_stripped() {
        let mods = parse_preset_str("   $   Foo  \r\n\t# not a mod\n");
        assert_eq!(mods.server, vec!["Foo"]);
        assert!(mods.global.is_empty());
        assert_eq!(mods.stats.skipped, 1);
    }

    #[test]
    fn counts_cover_every_non_empty_line() {
        let text = "ace\n#a\n\n  \n$b\n$\n#c\nrhs_afrf\n";
        let mods = parse_preset_str(text);
        let non_empty = text.lines().filter(|l| !l.trim().is_empty()).count();
        assert_eq!(
            mods.stats.global + mods.stats.server + mods.stats.skipped,
            non_empty
        );
        assert_eq!(mods.all(), vec!["ace", "rhs_afrf", "b"]);
    }

    #[test]
    fn order_follows_file_order() {
        let mods = parse_preset_str("B\nA\n$z\n$y\nC\n");
        assert_eq!(mods.global, vec!["B", "A", "C"]);
        assert_eq!(mods.server, vec!["z", "y"]);
    }

    #[test]
    fn lists_only_preset_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.md"), b"").unwrap();
        fs::create_dir(dir.path().join("old.txt")).unwrap();
        let presets = presets_in(dir.path(), &["vanilla.txt", "antistasi.TXT"]);

        let names: Vec<_> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["antistasi", "vanilla"]);
        assert_eq!(presets[0].index, 1);
        assert_eq!(presets[1].index, 2);
    }

    #[test]
    fn empty_dir_has_no_presets() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_presets(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LauncherError>(),
            Some(LauncherError::NoPresetsFound { .. })
        ));
    }

    #[test]
    fn single_preset_is_auto_selected() {
        let dir = tempfile::tempdir().unwrap();
        let presets = presets_in(dir.path(), &["only.txt"]);
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();

        let chosen = select_interactive(&presets, &mut input, &mut output).unwrap();
        assert_eq!(chosen.name, "only");
        assert!(String::from_utf8(output).unwrap().contains("using only"));
    }

    #[test]
    fn prompt_repeats_until_valid_index() {
        let dir = tempfile::tempdir().unwrap();
        let presets = presets_in(dir.path(), &["a.txt", "b.txt", "c.txt"]);
        let mut input = Cursor::new(b"x\n0\n9\n2\n".to_vec());
        let mut output = Vec::new();

        let chosen = select_interactive(&presets, &mut input, &mut output).unwrap();
        assert_eq!(chosen.name, "b");
        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("select preset").count(), 4);
        assert!(shown.contains("enter a number"));
        assert!(shown.contains("9 is out of range"));
    }

    #[test]
    fn closed_input_aborts_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let presets = presets_in(dir.path(), &["a.txt", "b.txt"]);
        let mut input = Cursor::new(b"abc\n".to_vec());
        let mut output = Vec::new();
        assert!(select_interactive(&presets, &mut input, &mut output).is_err());
    }

    #[test]
    fn select_by_exact_name() {
        let dir = tempfile::tempdir().unwrap();
        let presets = presets_in(dir.path(), &["a.txt", "b.txt"]);
        assert_eq!(select_by_name(&presets, "b").unwrap().index, 2);

        let err = select_by_name(&presets, "B").unwrap_err();
        match err.downcast_ref::<LauncherError>() {
            Some(LauncherError::InvalidPresetName { name, available }) => {
                assert_eq!(name, "B");
                assert_eq!(available, "a, b");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
