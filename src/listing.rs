//! Listing identifiers: parsing `Listing<CC>.<LL><suffix>.<caption>.<ext>` file
//! names and rendering them back as file names and namespaces.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::Error;

/// Anchored to the file name. Groups: chapter, number, suffix, caption, extension.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static LISTING_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^Listing(\d{2,})\.(\d{2,})([A-Za-z]*)(?:\.(.+))?\.([^.]+)$")
        .expect("valid listing regex");
});

/// Caption segment marking a listing file as a test.
const TEST_MARKER: &str = "Tests";

/// Chapter, number and suffix. Two listings with the same identity are the
/// same listing regardless of caption or extension.
///
/// Field order is the catalog sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Identity {
    /// Chapter number, rendered zero-padded to two digits.
    pub chapter: u32,
    /// Position of the listing within its chapter.
    pub number: u32,
    /// Letter marker of an extra listing; empty for canonical listings.
    pub suffix: String,
}

impl Identity {
    /// Build an identity with an empty suffix.
    pub const fn canonical(chapter: u32, number: u32) -> Self {
        return Self { chapter, number, suffix: String::new() };
    }

    /// `Listing01.02A`: the dotted form used in file names and resource paths.
    pub fn file_stem(&self) -> String {
        return format!("Listing{:02}.{:02}{}", self.chapter, self.number, self.suffix);
    }

    /// `Listing01_02A`: the form used as the last namespace segment.
    pub fn namespace_token(&self) -> String {
        return format!("Listing{:02}_{:02}{}", self.chapter, self.number, self.suffix);
    }

    /// `Chapter01`.
    pub fn chapter_segment(&self) -> String {
        return format!("Chapter{:02}", self.chapter);
    }

    /// Whether this is an extra listing sharing a base number.
    pub fn is_extra(&self) -> bool {
        return !self.suffix.is_empty();
    }
}

/// Un-padded `chapter.number`, as used in scan messages.
impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}.{}", self.chapter, self.number);
    }
}

/// A listing file parsed from its path. Never partially populated: a path that
/// does not match the listing grammar yields `Error::InvalidListing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingId {
    /// Free text after the number, without the leading dot. Kept verbatim.
    pub caption: String,
    /// File extension as written on disk, without the leading dot.
    pub extension: String,
    /// Chapter, number and suffix parsed from the file name.
    pub identity: Identity,
    /// Lives in a `.Tests` directory or carries a `Tests` caption segment.
    pub is_test: bool,
    /// Path the listing was discovered at.
    pub path: PathBuf,
}

impl ListingId {
    /// Parse a listing path, accepting only the given extensions (compared
    /// case-insensitively).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidListing` if the file name does not match the
    /// listing grammar, a number does not fit, or the extension is not approved.
    pub fn parse(path: &Path, extensions: &[String]) -> Result<Self, Error> {
        let invalid = |reason: &str| {
            return Error::InvalidListing { path: path.to_path_buf(), reason: reason.to_string() };
        };

        let file_name = path
            .file_name()
            .and_then(|n| return n.to_str())
            .ok_or_else(|| return invalid("no file name"))?;

        let caps = LISTING_FILE_NAME
            .captures(file_name)
            .ok_or_else(|| return invalid("does not match Listing<CC>.<LL>[suffix][.caption].<ext>"))?;

        let group = |i: usize| return caps.get(i).map_or("", |m| return m.as_str());

        let extension = group(5);
        if !extensions.iter().any(|e| return e.eq_ignore_ascii_case(extension)) {
            return Err(invalid("extension is not an approved listing type"));
        }

        let chapter = group(1).parse::<u32>().map_err(|_err| return invalid("chapter out of range"))?;
        let number = group(2).parse::<u32>().map_err(|_err| return invalid("number out of range"))?;
        let caption = group(4).to_string();

        let in_test_dir = path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|dir| return dir.to_string_lossy().contains(".Tests"));
        let test_caption = caption.split('.').any(|seg| return seg.eq_ignore_ascii_case(TEST_MARKER));

        return Ok(Self {
            caption,
            extension: extension.to_string(),
            identity: Identity { chapter, number, suffix: group(3).to_string() },
            is_test: in_test_dir || test_caption,
            path: path.to_path_buf(),
        });
    }

    /// File name this listing would carry under `identity`, with its own
    /// caption and extension reattached.
    pub fn file_name(&self, identity: &Identity) -> String {
        let stem = identity.file_stem();
        if self.caption.is_empty() {
            return format!("{stem}.{}", self.extension);
        }
        return format!("{stem}.{}.{}", self.caption, self.extension);
    }

    /// Path this listing would move to under `identity`: same directory, new name.
    pub fn path_for(&self, identity: &Identity) -> PathBuf {
        return self.path.with_file_name(self.file_name(identity));
    }

    /// Fully-qualified namespace under `identity`, with `.Tests` for test files.
    pub fn namespace(&self, root: &str, identity: &Identity) -> String {
        let base = format!("{root}.{}.{}", identity.chapter_segment(), identity.namespace_token());
        if self.is_test {
            return format!("{base}.{TEST_MARKER}");
        }
        return base;
    }
}
