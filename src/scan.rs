//! Read-only diagnostics over chapters: extra listings, listings without a
//! test, and tests without a listing.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::catalog::{self, Catalog};
use crate::config::Config;
use crate::error::Error;
use crate::listing::ListingId;
use crate::walk;

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Finding {
    /// A non-test listing carrying a suffix.
    ExtraListing {
        /// Absolute path of the listing.
        path: PathBuf,
    },
    /// A canonical listing without a paired test.
    MissingTest {
        /// Original, un-padded chapter number.
        chapter: u32,
        /// Original, un-padded listing number.
        number: u32,
        /// Absolute path of the listing.
        path: PathBuf,
    },
    /// A test that pairs with no canonical listing.
    OrphanTest {
        /// Absolute path of the test.
        path: PathBuf,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Finding::ExtraListing { path } => write!(f, "{}", path.display()),
            Finding::MissingTest { chapter, number, .. } => write!(f, "Missing test for {chapter}.{number}"),
            Finding::OrphanTest { path } => write!(f, "Orphaned test {}", path.display()),
        };
    }
}

/// Findings for every scanned chapter, in scan order.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    /// Chapter directories scanned.
    pub chapters: Vec<PathBuf>,
    /// Everything reported.
    pub findings: Vec<Finding>,
}

impl Report {
    /// Whether nothing was reported.
    pub fn is_clean(&self) -> bool {
        return self.findings.is_empty();
    }
}

/// A non-test listing whose name carries a suffix. Files under a `.Tests`
/// directory are never extra.
///
/// Listings that kept a suffix through a chapter-only renumber are reported
/// the same way as stray ones; the file name cannot tell them apart.
pub fn is_extra_listing(listing: &ListingId) -> bool {
    return !listing.is_test && listing.identity.is_extra();
}

/// Findings for one catalog: per listing in identity order, then orphan tests.
pub fn scan_chapter(catalog: &Catalog) -> Vec<Finding> {
    let mut findings = Vec::new();

    for entry in &catalog.entries {
        let listing = &entry.listing;
        if is_extra_listing(listing) {
            findings.push(Finding::ExtraListing { path: listing.path.clone() });
        }
        if catalog.test_for(entry).is_none() {
            findings.push(Finding::MissingTest {
                chapter: listing.identity.chapter,
                number: listing.identity.number,
                path: listing.path.clone(),
            });
        }
    }

    for orphan in catalog.orphan_tests() {
        findings.push(Finding::OrphanTest { path: orphan.path.clone() });
    }

    return findings;
}

/// Chapter directories to scan for `path`: the directory itself if it is a
/// chapter, otherwise every `Chapter<CC>` directory below it.
///
/// # Errors
///
/// Returns `Error::DirectoryNotFound` if `path` is not a directory.
pub fn chapter_dirs(path: &Path) -> Result<Vec<PathBuf>, Error> {
    if !path.is_dir() {
        return Err(Error::DirectoryNotFound { path: path.to_path_buf() });
    }
    let resolved = std::fs::canonicalize(path)?;
    if catalog::chapter_number(&resolved).is_some() {
        return Ok(vec![resolved]);
    }
    return Ok(walk::list_dirs(&resolved, &catalog::CHAPTER_DIR));
}

/// Scan a single chapter or a whole book.
///
/// # Errors
///
/// Returns `Error::DirectoryNotFound` if `path` is not a directory, or any
/// catalog error (duplicate listings or tests) from a chapter.
pub fn scan(path: &Path, config: &Config) -> Result<Report, Error> {
    let mut report = Report::default();
    for dir in chapter_dirs(path)? {
        let catalog = Catalog::load(&dir, config.tests, &config.extensions)?;
        tracing::debug!("scanned {} ({} listings)", dir.display(), catalog.entries.len());
        report.findings.extend(scan_chapter(&catalog));
        report.chapters.push(dir);
    }
    return Ok(report);
}
