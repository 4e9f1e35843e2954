use std::path::Path;

use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic: what happened, and
/// how to fix it where there is a fix.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::DuplicateListing { identity, first, second } => render_duplicate_listing(identity, first, second),
        Error::DuplicateTestAssociation { listing, first, second } => render_duplicate_test(listing, first, second),
        Error::MoveFailed { origin, destination, reason, completed, rewritten } => {
            render_move_failed(origin, destination, reason, *completed, *rewritten)
        },
        Error::NotAChapterDirectory { path } => render_not_a_chapter(path),
        Error::TargetCollision { identity, first, second } => render_target_collision(identity, first, second),
        _ => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::DirectoryNotFound { path } => format!("\
# Error: Directory Not Found

`{}` does not exist or is not a directory.
", path.display()),

        Error::InvalidConfig { reason } => format!("\
# Error: Invalid Config

{reason}

## Fix

Correct `.listings.toml`, or delete it to use the defaults.
"),

        Error::InvalidListing { path, reason } => format!("\
# Error: Not A Listing

`{}`: {reason}
", path.display()),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    }
}

fn render_duplicate_listing(identity: &str, first: &Path, second: &Path) -> String {
    format!("\
# Error: Duplicate Listing

`{identity}` is claimed by two files:

- `{}`
- `{}`

## Fix

Give one of them a suffix (`{identity}A`) or a different number, then run
`listings update` again.
", first.display(), second.display())
}

fn render_duplicate_test(listing: &Path, first: &Path, second: &Path) -> String {
    format!("\
# Error: Duplicate Test

`{}` has two tests:

- `{}`
- `{}`

## Fix

Merge the tests into one file or delete the stale one.
", listing.display(), first.display(), second.display())
}

fn render_move_failed(origin: &Path, destination: &Path, reason: &str, completed: usize, rewritten: usize) -> String {
    if completed == 0 {
        return format!("\
# Error: Move Failed

Could not move `{}` to `{}`: {reason}

Nothing was moved or rewritten.
", origin.display(), destination.display());
    }
    format!("\
# Error: Move Failed

Could not move `{}` to `{}`: {reason}

{completed} renames were already applied and are left in place. {rewritten} files
were rewritten to match them; references to the listings that did not move are
unchanged.

## Fix

Resolve the failure, then run `listings update` again to finish the remaining
renames.
", origin.display(), destination.display())
}

fn render_not_a_chapter(path: &Path) -> String {
    format!("\
# Error: Not A Chapter Directory

`{}` is not named `Chapter<CC>`, so no chapter number can be taken from it.

## Fix

Rename the directory, or drop `--by-folder` / `--chapter-only`.
", path.display())
}

fn render_target_collision(identity: &str, first: &Path, second: &Path) -> String {
    format!("\
# Error: Renumbering Collision

Both of these would become `{identity}`:

- `{}`
- `{}`

Nothing was moved.
", first.display(), second.display())
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn move_failure_mentions_progress() {
        let md = render_error(&Error::MoveFailed {
            completed: 3,
            destination: PathBuf::from("Listing01.02.cs"),
            origin: PathBuf::from("Listing01.05.cs"),
            reason: "permission denied".to_string(),
            rewritten: 4,
        });
        assert!(md.starts_with("# Error: Move Failed"));
        assert!(md.contains("3 renames were already applied"));
        assert!(md.contains("4 files\nwere rewritten"));
    }

    #[test]
    fn move_failure_before_any_rename_says_nothing_changed() {
        let md = render_error(&Error::MoveFailed {
            completed: 0,
            destination: PathBuf::from("Listing01.02.cs"),
            origin: PathBuf::from("Listing01.05.cs"),
            reason: "destination already exists".to_string(),
            rewritten: 0,
        });
        assert!(md.contains("Nothing was moved or rewritten."));
        assert!(!md.contains("run `listings update` again"));
    }

    #[test]
    fn generic_errors_get_a_heading() {
        let md = render_error(&Error::DirectoryNotFound { path: PathBuf::from("Chapter99") });
        assert!(md.starts_with("# Error: Directory Not Found"));
    }
}
