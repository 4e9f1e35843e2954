//! Directory walking for catalogs and whole-book scans.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::{DirEntry, WalkDir};

/// Skip dot-directories such as `.git` below the root.
fn is_hidden(entry: &DirEntry) -> bool {
    return entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.');
}

/// List files under `root` whose file name matches `pattern`.
///
/// Non-recursive walks see only the direct children of `root`. Unreadable
/// entries are skipped. The order is unspecified; callers sort.
pub fn list_files(root: &Path, recursive: bool, pattern: &Regex) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    return WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| return !is_hidden(e))
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file())
        .filter(|e| return pattern.is_match(&e.file_name().to_string_lossy()))
        .map(DirEntry::into_path)
        .collect();
}

/// List directories under `root`, sorted by name at each level, whose name
/// matches `pattern`. A matching directory is not descended into.
pub fn list_dirs(root: &Path, pattern: &Regex) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();

    while let Some(next) = walker.next() {
        let Ok(entry) = next else { continue };
        if !entry.file_type().is_dir() || is_hidden(&entry) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }
        if pattern.is_match(&entry.file_name().to_string_lossy()) {
            found.push(entry.into_path());
            walker.skip_current_dir();
        }
    }

    return found;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn non_recursive_walk_ignores_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Listing01.01.cs"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/Listing01.02.cs"), "").unwrap();
        std::fs::write(dir.path().join("Program.cs"), "").unwrap();

        let pattern = Regex::new("^Listing").unwrap();
        let flat = list_files(dir.path(), false, &pattern);
        assert_eq!(flat, vec![dir.path().join("Listing01.01.cs")]);

        let mut deep = list_files(dir.path(), true, &pattern);
        deep.sort();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/Listing01.01.cs"), "").unwrap();

        let pattern = Regex::new(".").unwrap();
        assert!(list_files(dir.path(), true, &pattern).is_empty());
    }

    #[test]
    fn matching_directories_are_sorted_and_not_descended() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Chapter02", "Chapter01", "Chapter01.Tests", "Other/Chapter03", "Chapter01/Chapter09"] {
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }

        let pattern = Regex::new(r"^Chapter\d{2,}$").unwrap();
        let dirs = list_dirs(dir.path(), &pattern);
        assert_eq!(
            dirs,
            vec![
                dir.path().join("Chapter01"),
                dir.path().join("Chapter02"),
                dir.path().join("Other/Chapter03"),
            ]
        );
    }
}
