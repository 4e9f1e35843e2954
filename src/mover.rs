//! Move providers: how a renamed listing file gets from its old path to its new one.

use std::io;
use std::path::Path;
use std::process::Command;

use crate::config::MoverKind;

/// Relocates one file. The rewriter depends on nothing else about a provider.
pub trait FileMover {
    /// Move `source` to `destination`. The destination is known not to exist.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure; the caller aborts the renaming pass.
    fn move_file(&self, source: &Path, destination: &Path) -> io::Result<()>;
}

/// Plain filesystem move. Falls back to copy-then-delete across volumes, which
/// is not atomic.
#[derive(Debug, Default)]
pub struct FsMover;

impl FileMover for FsMover {
    fn move_file(&self, source: &Path, destination: &Path) -> io::Result<()> {
        return match std::fs::rename(source, destination) {
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                std::fs::copy(source, destination)?;
                std::fs::remove_file(source)
            },
            other => other,
        };
    }
}

/// `git mv`, so the rename is recorded as a tracked rename in history.
#[derive(Debug, Default)]
pub struct GitMover;

impl FileMover for GitMover {
    fn move_file(&self, source: &Path, destination: &Path) -> io::Result<()> {
        let dir = source.parent().unwrap_or_else(|| return Path::new("."));
        let output = Command::new("git")
            .arg("-C")
            .arg(dir)
            .arg("mv")
            .arg(source)
            .arg(destination)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(io::Error::other(format!("git mv failed: {}", stderr.trim())));
        }
        return Ok(());
    }
}

/// The provider selected by configuration or `--git`.
pub fn for_kind(kind: MoverKind) -> Box<dyn FileMover> {
    return match kind {
        MoverKind::Filesystem => Box::new(FsMover),
        MoverKind::Git => Box::new(GitMover),
    };
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn fs_mover_renames_and_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("Listing01.02.cs");
        let to = dir.path().join("Listing01.01.cs");
        std::fs::write(&from, "namespace A;\n").unwrap();

        FsMover.move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "namespace A;\n");
    }

    #[test]
    fn fs_mover_reports_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = FsMover.move_file(&dir.path().join("gone.cs"), &dir.path().join("other.cs"));
        assert!(result.is_err());
    }

    #[test]
    fn git_mover_fails_outside_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("Listing01.02.cs");
        std::fs::write(&from, "").unwrap();
        let result = GitMover.move_file(&from, &dir.path().join("Listing01.01.cs"));
        assert!(result.is_err());
        assert!(from.exists());
    }
}
