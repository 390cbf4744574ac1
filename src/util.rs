use std::path::{Path, PathBuf};

/// Hands out `<stem>_<n>.<ext>` names for files that would collide in a
/// directory. The counter is shared by every name handed out through the
/// same instance, so it only ever grows during one copy pass.
#[derive(Debug, Default)]
pub struct CollisionNamer {
    counter: u32,
}

impl CollisionNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique_path(&mut self, base_dir: &Path, file_name: &str) -> PathBuf {
        let candidate = base_dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        let ext = Path::new(file_name).extension().and_then(|s| s.to_str());
        loop {
            self.counter += 1;
            let mut name = format!("{}_{}", stem, self.counter);
            if let Some(ext) = ext {
                name.push('.');
                name.push_str(ext);
            }
            let candidate = base_dir.join(&name);
            if !candidate.exists() {
                return candidate;
            }
        }
    }
}

pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|value| value.eq_ignore_ascii_case(ext))
}
