//! Renumbering: compute the target identity of every listing in a chapter and
//! the rename plan that gets the files there.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::error::Error;
use crate::listing::{Identity, ListingId};

/// How target identities are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Replace only the chapter number; number and suffix are kept.
    ChapterOnly,
    /// Number listings `1..=k` in identity order, folding extras into the sequence.
    #[default]
    Full,
}

/// Renumbering options for one chapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Take the chapter number from the `Chapter<CC>` directory name instead
    /// of each file's own. Always on in `Mode::ChapterOnly`.
    pub by_folder: bool,
    /// Target assignment mode.
    pub mode: Mode,
}

/// One file to move: where it is, where it goes, and its namespace there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// Destination path, same directory as `source`.
    pub destination: PathBuf,
    /// Whether this entry moves a paired test file.
    pub is_test: bool,
    /// Fully-qualified namespace the file declares after the move.
    pub namespace: String,
    /// Identity parsed from the current file name.
    pub original: Identity,
    /// Current path.
    pub source: PathBuf,
    /// Identity after renumbering.
    pub target: Identity,
}

impl PlanEntry {
    /// Build the entry moving `listing` to `target`.
    fn new(listing: &ListingId, target: &Identity, namespace_root: &str) -> Self {
        return Self {
            destination: listing.path_for(target),
            is_test: listing.is_test,
            namespace: listing.namespace(namespace_root, target),
            original: listing.identity.clone(),
            source: listing.path.clone(),
            target: target.clone(),
        };
    }

    /// Whether the target sorts above the original: suffix folding, or a
    /// by-folder move to a higher chapter.
    fn moves_up(&self) -> bool {
        return self.target > self.original;
    }
}

/// Every rename for one chapter, in ascending original order with each test
/// entry directly after its listing. Unchanged listings have no entry.
#[derive(Debug, Default)]
pub struct Plan {
    /// Rename entries.
    pub entries: Vec<PlanEntry>,
    /// Old identity to new identity, for rewriting references.
    pub mapping: BTreeMap<Identity, Identity>,
}

impl Plan {
    /// Whether nothing needs to change.
    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    /// Entries in an order where no destination is still held by a file that
    /// has yet to move: entries moving down (or only shedding a suffix) in
    /// ascending order, then entries moving up in descending order.
    ///
    /// Targets are strictly increasing in the original order, so a downward
    /// entry's slot can only be held by an earlier downward entry, and an
    /// upward entry's slot only by a later upward entry.
    pub fn execution_order(&self) -> Vec<&PlanEntry> {
        let (up, down): (Vec<&PlanEntry>, Vec<&PlanEntry>) =
            self.entries.iter().partition(|e| return e.moves_up());
        return down.into_iter().chain(up.into_iter().rev()).collect();
    }
}

/// Target identity of the listing at `position` (0-based) under `options`.
///
/// # Errors
///
/// Returns `Error::InvalidListing` if the position does not fit a listing number.
fn target_for(listing: &ListingId, position: usize, chapter: Option<u32>, mode: Mode) -> Result<Identity, Error> {
    let original = &listing.identity;
    let chapter = chapter.unwrap_or(original.chapter);
    return match mode {
        Mode::ChapterOnly => Ok(Identity { chapter, number: original.number, suffix: original.suffix.clone() }),
        Mode::Full => {
            let number = position
                .checked_add(1)
                .and_then(|n| return u32::try_from(n).ok())
                .ok_or_else(|| {
                    return Error::InvalidListing {
                        path: listing.path.clone(),
                        reason: "listing position exceeds the numbering range".to_string(),
                    };
                })?;
            Ok(Identity::canonical(chapter, number))
        },
    };
}

/// Compute the rename plan for a catalog.
///
/// # Errors
///
/// Returns `Error::NotAChapterDirectory` if by-folder resolution is requested
/// for a directory not named `Chapter<CC>`, or `Error::TargetCollision` if two
/// listings would receive the same identity.
pub fn plan(catalog: &Catalog, options: Options, namespace_root: &str) -> Result<Plan, Error> {
    let chapter = if options.by_folder || options.mode == Mode::ChapterOnly {
        let folder = catalog
            .folder_chapter()
            .ok_or_else(|| return Error::NotAChapterDirectory { path: catalog.chapter_dir.clone() })?;
        Some(folder)
    } else {
        None
    };

    let mut plan = Plan::default();
    let mut claimed: BTreeMap<Identity, &PathBuf> = BTreeMap::new();

    for (position, entry) in catalog.entries.iter().enumerate() {
        let listing = &entry.listing;
        let target = target_for(listing, position, chapter, options.mode)?;

        if let Some(first) = claimed.insert(target.clone(), &listing.path) {
            return Err(Error::TargetCollision {
                first: first.clone(),
                identity: target.file_stem(),
                second: listing.path.clone(),
            });
        }

        if target == listing.identity {
            continue;
        }

        tracing::debug!("plan {} -> {}", listing.identity.file_stem(), target.file_stem());
        plan.entries.push(PlanEntry::new(listing, &target, namespace_root));
        if let Some(test) = catalog.test_for(entry) {
            plan.entries.push(PlanEntry::new(test, &target, namespace_root));
        }
        plan.mapping.insert(listing.identity.clone(), target);
    }

    return Ok(plan);
}
