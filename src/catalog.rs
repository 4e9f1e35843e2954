//! Chapter catalogs: the canonical listings of one chapter in identity order,
//! each joined to its paired test listing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::TestLayout;
use crate::error::Error;
use crate::listing::{Identity, ListingId};
use crate::walk;

/// `Chapter<CC>`, without a `.Tests` suffix.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
pub static CHAPTER_DIR: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^Chapter(\d{2,})$").expect("valid chapter regex");
});

/// Candidate listing files, before full parsing.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static LISTING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^Listing").expect("valid prefix regex");
});

/// Every file, for the reference-rewrite snapshot.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static ANY_FILE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r".").expect("valid wildcard regex");
});

/// A canonical listing and the index of its paired test in `Catalog::tests`.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The canonical (non-test) listing.
    pub listing: ListingId,
    /// Index into `Catalog::tests`; `None` when the listing has no test.
    pub test: Option<usize>,
}

/// Snapshot of one chapter directory and its paired test directory.
#[derive(Debug)]
pub struct Catalog {
    /// Absolute path of the chapter directory.
    pub chapter_dir: PathBuf,
    /// Canonical listings sorted by original identity.
    pub entries: Vec<Entry>,
    /// Every file under the chapter and test directories at load time.
    pub files: Vec<PathBuf>,
    /// Indices into `tests` that matched no canonical listing.
    pub orphans: Vec<usize>,
    /// Directory tests are read from; may not exist.
    pub test_dir: PathBuf,
    /// Test listings sorted by original identity.
    pub tests: Vec<ListingId>,
}

/// The chapter number encoded in a `Chapter<CC>` directory name.
pub fn chapter_number(dir: &Path) -> Option<u32> {
    let name = dir.file_name()?.to_str()?;
    let caps = CHAPTER_DIR.captures(name)?;
    return caps.get(1)?.as_str().parse().ok();
}

/// Where tests for `chapter_dir` live under `layout`.
///
/// # Errors
///
/// Returns `Error::NotAChapterDirectory` for a sibling layout when
/// `chapter_dir` has no name to put `.Tests` after, such as `/`.
pub fn test_dir_for(chapter_dir: &Path, layout: TestLayout) -> Result<PathBuf, Error> {
    return match layout {
        TestLayout::SameDirectory => Ok(chapter_dir.to_path_buf()),
        TestLayout::Sibling => {
            let Some(name) = chapter_dir.file_name() else {
                return Err(Error::NotAChapterDirectory { path: chapter_dir.to_path_buf() });
            };
            let mut name = name.to_os_string();
            name.push(".Tests");
            Ok(chapter_dir.with_file_name(name))
        },
    };
}

/// Parse every listing-looking file in `dir`, dropping the ones that turn out
/// not to be listings.
fn parse_listings(dir: &Path, extensions: &[String]) -> Vec<ListingId> {
    return walk::list_files(dir, false, &LISTING_PREFIX)
        .into_iter()
        .filter_map(|path| {
            return match ListingId::parse(&path, extensions) {
                Err(e) => {
                    tracing::debug!("skipping {e}");
                    None
                },
                Ok(id) => Some(id),
            };
        })
        .collect();
}

/// Reject two listings sharing an identity; the sort order would otherwise tie.
///
/// # Errors
///
/// Returns `Error::DuplicateListing` naming both files.
fn reject_duplicate_identities(sorted: &[ListingId]) -> Result<(), Error> {
    for pair in sorted.windows(2) {
        if let [first, second] = pair
            && first.identity == second.identity
        {
            return Err(Error::DuplicateListing {
                first: first.path.clone(),
                identity: first.identity.file_stem(),
                second: second.path.clone(),
            });
        }
    }
    return Ok(());
}

impl Catalog {
    /// Scan a chapter directory and its paired test directory.
    ///
    /// Files that are not listings are skipped. Canonical listings and tests
    /// are each sorted by original (chapter, number, suffix). Each test joins
    /// the canonical listing with the same identity; unmatched tests are
    /// recorded as orphans.
    ///
    /// # Errors
    ///
    /// Returns `Error::DirectoryNotFound` if `chapter_dir` is not a directory,
    /// `Error::Io` if it cannot be canonicalized,
    /// `Error::NotAChapterDirectory` if it is a filesystem root with sibling tests,
    /// `Error::DuplicateListing` if two canonical listings share an identity,
    /// or `Error::DuplicateTestAssociation` if two tests pair with one listing.
    pub fn load(chapter_dir: &Path, layout: TestLayout, extensions: &[String]) -> Result<Self, Error> {
        if !chapter_dir.is_dir() {
            return Err(Error::DirectoryNotFound { path: chapter_dir.to_path_buf() });
        }
        let chapter_dir = std::fs::canonicalize(chapter_dir)?;
        let test_dir = test_dir_for(&chapter_dir, layout)?;

        let mut found = parse_listings(&chapter_dir, extensions);
        let mut files = walk::list_files(&chapter_dir, true, &ANY_FILE);
        if test_dir != chapter_dir && test_dir.is_dir() {
            found.extend(parse_listings(&test_dir, extensions));
            files.extend(walk::list_files(&test_dir, true, &ANY_FILE));
        }
        files.sort();

        let (mut tests, mut canonical): (Vec<ListingId>, Vec<ListingId>) =
            found.into_iter().partition(|id| return id.is_test);
        canonical.sort_by(|a, b| return a.identity.cmp(&b.identity));
        tests.sort_by(|a, b| return a.identity.cmp(&b.identity));
        reject_duplicate_identities(&canonical)?;

        let by_identity: HashMap<&Identity, usize> =
            canonical.iter().enumerate().map(|(i, id)| return (&id.identity, i)).collect();
        let mut pairs: Vec<Option<usize>> = vec![None; canonical.len()];
        let mut orphans = Vec::new();

        for (test_index, test) in tests.iter().enumerate() {
            let Some(&listing_index) = by_identity.get(&test.identity) else {
                orphans.push(test_index);
                continue;
            };
            let Some(slot) = pairs.get_mut(listing_index) else { continue };
            if let Some(existing) = slot.and_then(|i| return tests.get(i)) {
                return Err(Error::DuplicateTestAssociation {
                    first: existing.path.clone(),
                    listing: canonical.get(listing_index).map(|l| return l.path.clone()).unwrap_or_default(),
                    second: test.path.clone(),
                });
            }
            *slot = Some(test_index);
        }

        let entries = canonical
            .into_iter()
            .zip(pairs)
            .map(|(listing, test)| return Entry { listing, test })
            .collect();

        return Ok(Self { chapter_dir, entries, files, orphans, test_dir, tests });
    }

    /// The chapter number of the catalog's own directory name, if it has one.
    pub fn folder_chapter(&self) -> Option<u32> {
        return chapter_number(&self.chapter_dir);
    }

    /// Tests that matched no canonical listing.
    pub fn orphan_tests(&self) -> impl Iterator<Item = &ListingId> {
        return self.orphans.iter().filter_map(|&i| return self.tests.get(i));
    }

    /// The test paired with `entry`, if any.
    pub fn test_for(&self, entry: &Entry) -> Option<&ListingId> {
        return entry.test.and_then(|i| return self.tests.get(i));
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        return vec!["cs".to_string(), "xml".to_string()];
    }

    fn touch(dir: &Path, names: &[&str]) {
        std::fs::create_dir_all(dir).unwrap();
        for name in names {
            std::fs::write(dir.join(name), "").unwrap();
        }
    }

    fn stems(catalog: &Catalog) -> Vec<String> {
        return catalog.entries.iter().map(|e| return e.listing.identity.file_stem()).collect();
    }

    #[test]
    fn sorts_by_identity_with_suffixes_after_base() {
        let book = tempfile::tempdir().unwrap();
        let chapter = book.path().join("Chapter01");
        touch(&chapter, &["Listing01.02.cs", "Listing01.01B.cs", "Listing01.01.cs", "Listing01.01A.Some.cs"]);

        let catalog = Catalog::load(&chapter, TestLayout::Sibling, &exts()).unwrap();
        assert_eq!(stems(&catalog), vec!["Listing01.01", "Listing01.01A", "Listing01.01B", "Listing01.02"]);
    }

    #[test]
    fn skips_files_that_are_not_listings() {
        let book = tempfile::tempdir().unwrap();
        let chapter = book.path().join("Chapter01");
        touch(&chapter, &["Listing01.01.cs", "Chapter01.csproj", "Listing01.02.txt", "ListingNotes.md"]);

        let catalog = Catalog::load(&chapter, TestLayout::Sibling, &exts()).unwrap();
        assert_eq!(stems(&catalog), vec!["Listing01.01"]);
        assert_eq!(catalog.files.len(), 4);
    }

    #[test]
    fn pairs_sibling_tests_and_records_orphans() {
        let book = tempfile::tempdir().unwrap();
        let chapter = book.path().join("Chapter02");
        touch(&chapter, &["Listing02.01.cs", "Listing02.02.cs"]);
        touch(&book.path().join("Chapter02.Tests"), &["Listing02.01.Tests.cs", "Listing02.07.Tests.cs"]);

        let catalog = Catalog::load(&chapter, TestLayout::Sibling, &exts()).unwrap();
        let first = catalog.entries.first().unwrap();
        let second = catalog.entries.get(1).unwrap();
        assert_eq!(catalog.test_for(first).unwrap().identity, Identity::canonical(2, 1));
        assert!(catalog.test_for(second).is_none());

        let orphans: Vec<&ListingId> = catalog.orphan_tests().collect();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans.first().unwrap().identity, Identity::canonical(2, 7));
    }

    #[test]
    fn pairs_tests_in_same_directory() {
        let book = tempfile::tempdir().unwrap();
        let chapter = book.path().join("Chapter03");
        touch(&chapter, &["Listing03.01.cs", "Listing03.01.Tests.cs"]);

        let catalog = Catalog::load(&chapter, TestLayout::SameDirectory, &exts()).unwrap();
        assert_eq!(catalog.entries.len(), 1);
        assert!(catalog.test_for(catalog.entries.first().unwrap()).is_some());
    }

    #[test]
    fn two_tests_for_one_listing_is_an_error() {
        let book = tempfile::tempdir().unwrap();
        let chapter = book.path().join("Chapter04");
        touch(&chapter, &["Listing04.01.cs"]);
        touch(&book.path().join("Chapter04.Tests"), &["Listing04.01.Tests.cs", "Listing04.01.More.Tests.cs"]);

        let err = Catalog::load(&chapter, TestLayout::Sibling, &exts()).unwrap_err();
        assert!(matches!(err, Error::DuplicateTestAssociation { .. }));
    }

    #[test]
    fn two_listings_with_one_identity_is_an_error() {
        let book = tempfile::tempdir().unwrap();
        let chapter = book.path().join("Chapter04");
        touch(&chapter, &["Listing04.01.cs", "Listing04.01.Other.cs"]);

        let err = Catalog::load(&chapter, TestLayout::Sibling, &exts()).unwrap_err();
        assert!(matches!(err, Error::DuplicateListing { .. }));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let book = tempfile::tempdir().unwrap();
        let err = Catalog::load(&book.path().join("Chapter09"), TestLayout::Sibling, &exts()).unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound { .. }));
    }

    #[test]
    fn chapter_number_reads_directory_name() {
        assert_eq!(chapter_number(Path::new("book/Chapter18")), Some(18));
        assert_eq!(chapter_number(Path::new("book/Chapter18.Tests")), None);
        assert_eq!(chapter_number(Path::new("book/Appendix")), None);
    }

    #[test]
    fn sibling_test_dir_appends_tests() {
        let dir = test_dir_for(Path::new("/book/Chapter05"), TestLayout::Sibling).unwrap();
        assert_eq!(dir, PathBuf::from("/book/Chapter05.Tests"));
        let same = test_dir_for(Path::new("/book/Chapter05"), TestLayout::SameDirectory).unwrap();
        assert_eq!(same, PathBuf::from("/book/Chapter05"));
    }

    #[test]
    fn filesystem_root_has_no_sibling_test_dir() {
        let err = test_dir_for(Path::new("/"), TestLayout::Sibling).unwrap_err();
        assert!(matches!(err, Error::NotAChapterDirectory { .. }));
        assert_eq!(test_dir_for(Path::new("/"), TestLayout::SameDirectory).unwrap(), PathBuf::from("/"));
    }
}
