//! Shell profile mutation with a single pre-run backup.
//!
//! Steps declare what they need as a [`ProfileEdit`]: either an appended
//! block guarded by a marker comment, or an in-place replacement of a
//! recognizable line (theme name, plugin list). Before the first write of
//! a run, the existing profile is copied once to a timestamped backup so
//! prior customizations can be recovered.

use std::io;
use std::path::{Path, PathBuf};

const TARGET: &str = "devup::profile";

/// One requested edit to the profile file. Ephemeral; only the file bytes
/// persist.
#[derive(Debug, Clone)]
pub enum ProfileEdit {
    /// Append `block` under a `marker` comment line. Skipped entirely
    /// when the marker is already present, making re-runs duplicate-free.
    Append { marker: &'static str, block: String },
    /// Replace the first line starting with `prefix` in place; appended
    /// at the end when no such line exists.
    ReplaceLine { prefix: &'static str, line: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Written,
    AlreadyPresent,
}

#[derive(Debug)]
pub struct ProfileMutator {
    target: PathBuf,
    backup_stamp: String,
    backed_up: bool,
    mutated: bool,
}

impl ProfileMutator {
    /// The backup timestamp is captured here, at run start, so every edit
    /// within one run shares a single backup file.
    pub fn new(target: PathBuf) -> Self {
        let backup_stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        Self {
            target,
            backup_stamp,
            backed_up: false,
            mutated: false,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Whether any edit has been written during this run.
    pub fn has_mutated(&self) -> bool {
        self.mutated
    }

    pub fn backup_path(&self) -> PathBuf {
        let name = format!(
            "{}.devup-backup-{}",
            self.target
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            self.backup_stamp
        );
        self.target.with_file_name(name)
    }

    /// Read-only form of the idempotence checks in [`Self::apply`]: does
    /// the profile already carry this edit? Unreadable targets count as
    /// not satisfied.
    pub fn satisfies(&self, edit: &ProfileEdit) -> bool {
        let Ok(current) = std::fs::read_to_string(&self.target) else {
            return false;
        };
        match edit {
            ProfileEdit::Append { marker, .. } => {
                current.lines().any(|line| line.trim() == *marker)
            }
            ProfileEdit::ReplaceLine { prefix, line } => current
                .lines()
                .any(|existing| {
                    existing.trim_start().starts_with(prefix) && existing.trim() == line.trim()
                }),
        }
    }

    pub fn apply(&mut self, edit: &ProfileEdit) -> io::Result<Applied> {
        let current = match std::fs::read_to_string(&self.target) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err),
        };

        let updated = match edit {
            ProfileEdit::Append { marker, block } => {
                if current.lines().any(|line| line.trim() == *marker) {
                    return Ok(Applied::AlreadyPresent);
                }
                let mut next = current.clone();
                if !next.is_empty() && !next.ends_with('\n') {
                    next.push('\n');
                }
                next.push_str(marker);
                next.push('\n');
                next.push_str(block.trim_end());
                next.push('\n');
                next
            }
            ProfileEdit::ReplaceLine { prefix, line } => {
                let mut replaced = false;
                let mut lines: Vec<String> = Vec::with_capacity(current.lines().count() + 1);
                for existing in current.lines() {
                    if !replaced && existing.trim_start().starts_with(prefix) {
                        if existing.trim() == line.trim() {
                            return Ok(Applied::AlreadyPresent);
                        }
                        lines.push(line.clone());
                        replaced = true;
                    } else {
                        lines.push(existing.to_string());
                    }
                }
                if !replaced {
                    lines.push(line.clone());
                }
                let mut next = lines.join("\n");
                next.push('\n');
                next
            }
        };

        self.backup_once()?;
        // Shell RC files always get Unix line endings
        std::fs::write(&self.target, updated.replace("\r\n", "\n"))?;
        self.mutated = true;
        tracing::debug!(target: TARGET, file = %self.target.display(), "profile updated");
        Ok(Applied::Written)
    }

    fn backup_once(&mut self) -> io::Result<()> {
        if self.backed_up {
            return Ok(());
        }
        self.backed_up = true;
        if self.target.exists() {
            let backup = self.backup_path();
            std::fs::copy(&self.target, &backup)?;
            tracing::info!(target: TARGET, backup = %backup.display(), "saved profile backup");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mutator(dir: &tempfile::TempDir) -> ProfileMutator {
        ProfileMutator::new(dir.path().join(".zshrc"))
    }

    #[test]
    fn append_creates_missing_file_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = mutator(&dir);
        let edit = ProfileEdit::Append {
            marker: "# devup: rust",
            block: ". \"$HOME/.cargo/env\"".to_string(),
        };
        assert_eq!(profile.apply(&edit).unwrap(), Applied::Written);
        let content = std::fs::read_to_string(profile.target()).unwrap();
        assert_eq!(content, "# devup: rust\n. \"$HOME/.cargo/env\"\n");
        assert!(!profile.backup_path().exists());
    }

    #[test]
    fn append_is_idempotent_via_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = mutator(&dir);
        let edit = ProfileEdit::Append {
            marker: "# devup: rust",
            block: ". \"$HOME/.cargo/env\"".to_string(),
        };
        profile.apply(&edit).unwrap();
        assert_eq!(profile.apply(&edit).unwrap(), Applied::AlreadyPresent);
        let content = std::fs::read_to_string(profile.target()).unwrap();
        assert_eq!(content.matches("cargo/env").count(), 1);
    }

    #[test]
    fn replace_line_edits_in_place() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".zshrc"),
            "export PATH=$PATH\nZSH_THEME=\"robbyrussell\"\nplugins=(git)\n",
        )
        .unwrap();
        let mut profile = mutator(&dir);
        profile
            .apply(&ProfileEdit::ReplaceLine {
                prefix: "ZSH_THEME=",
                line: "ZSH_THEME=\"agnoster\"".to_string(),
            })
            .unwrap();
        let content = std::fs::read_to_string(profile.target()).unwrap();
        assert!(content.contains("ZSH_THEME=\"agnoster\""));
        assert!(!content.contains("robbyrussell"));
        assert_eq!(content.matches("ZSH_THEME=").count(), 1);
    }

    #[test]
    fn replace_line_appends_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".zshrc"), "export EDITOR=vim\n").unwrap();
        let mut profile = mutator(&dir);
        profile
            .apply(&ProfileEdit::ReplaceLine {
                prefix: "plugins=",
                line: "plugins=(git docker)".to_string(),
            })
            .unwrap();
        let content = std::fs::read_to_string(profile.target()).unwrap();
        assert!(content.ends_with("plugins=(git docker)\n"));
    }

    #[test]
    fn existing_profile_is_backed_up_exactly_once_with_prior_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let original = "# my customizations\nalias k=kubectl\n";
        std::fs::write(dir.path().join(".zshrc"), original).unwrap();
        let mut profile = mutator(&dir);

        profile
            .apply(&ProfileEdit::Append {
                marker: "# devup: a",
                block: "export A=1".to_string(),
            })
            .unwrap();
        profile
            .apply(&ProfileEdit::Append {
                marker: "# devup: b",
                block: "export B=1".to_string(),
            })
            .unwrap();

        let backup = profile.backup_path();
        assert!(backup.exists());
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);

        // One backup file in total, despite two mutations
        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| {
                entry
                    .as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .contains("devup-backup")
            })
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn satisfies_mirrors_the_applied_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = mutator(&dir);
        let append = ProfileEdit::Append {
            marker: "# devup: rust",
            block: ". \"$HOME/.cargo/env\"".to_string(),
        };
        let replace = ProfileEdit::ReplaceLine {
            prefix: "ZSH_THEME=",
            line: "ZSH_THEME=\"agnoster\"".to_string(),
        };

        // Missing file satisfies nothing
        assert!(!profile.satisfies(&append));
        assert!(!profile.satisfies(&replace));

        profile.apply(&append).unwrap();
        assert!(profile.satisfies(&append));
        assert!(!profile.satisfies(&replace));

        profile.apply(&replace).unwrap();
        assert!(profile.satisfies(&replace));
    }

    #[test]
    fn untouched_run_makes_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".zshrc"), "ZSH_THEME=\"agnoster\"\n").unwrap();
        let mut profile = mutator(&dir);
        let applied = profile
            .apply(&ProfileEdit::ReplaceLine {
                prefix: "ZSH_THEME=",
                line: "ZSH_THEME=\"agnoster\"".to_string(),
            })
            .unwrap();
        assert_eq!(applied, Applied::AlreadyPresent);
        assert!(!profile.has_mutated());
        assert!(!profile.backup_path().exists());
    }
}
