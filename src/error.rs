/// Crate-level error types for listings diagnostics.
use std::path::PathBuf;

/// All errors carry enough context to produce a useful diagnostic without a
/// debugger. Each variant names the file, listing, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A directory passed on the command line does not exist.
    #[error("directory not found: {}", path.display())]
    DirectoryNotFound {
        /// Path that was expected to be a directory.
        path: PathBuf,
    },

    /// Two canonical listings in one chapter share a chapter, number and suffix.
    #[error("duplicate listing {identity}: {} and {}", first.display(), second.display())]
    DuplicateListing {
        /// First file carrying the identity.
        first: PathBuf,
        /// `Listing<CC>.<LL><suffix>` stem both files share.
        identity: String,
        /// Second file carrying the identity.
        second: PathBuf,
    },

    /// Two test files resolve to the same canonical listing.
    #[error("duplicate test for {}: {} and {}", listing.display(), first.display(), second.display())]
    DuplicateTestAssociation {
        /// Test already paired with the listing.
        first: PathBuf,
        /// Canonical listing both tests resolve to.
        listing: PathBuf,
        /// Test that would overwrite the pairing.
        second: PathBuf,
    },

    /// The renumbering would give two listings the same target identity.
    #[error("renumbering collision on {identity}: {} and {}", first.display(), second.display())]
    TargetCollision {
        /// First listing mapped to the identity.
        first: PathBuf,
        /// `Listing<CC>.<LL><suffix>` stem both would receive.
        identity: String,
        /// Second listing mapped to the identity.
        second: PathBuf,
    },

    /// `.listings.toml` is well-formed TOML but semantically unusable.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A path does not name a listing file. Recovered locally as "not a listing"
    /// by catalog construction.
    #[error("not a listing: {}: {reason}", path.display())]
    InvalidListing {
        /// Path that failed to parse.
        path: PathBuf,
        /// Which part of the grammar did not match.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of a report failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The move provider could not relocate a file. Renames completed before
    /// this one are left in place, with content rewritten to match them.
    #[error("move failed: {} -> {}: {reason} ({completed} renames already applied)", origin.display(), destination.display())]
    MoveFailed {
        /// Number of renames applied before the failure.
        completed: usize,
        /// Where the file was going.
        destination: PathBuf,
        /// The file being moved.
        origin: PathBuf,
        /// Why the provider refused.
        reason: String,
        /// Files rewritten to match the completed renames.
        rewritten: usize,
    },

    /// The operation needs a `Chapter<CC>` directory and got something else.
    #[error("not a chapter directory (expected Chapter<CC>): {}", path.display())]
    NotAChapterDirectory {
        /// The offending directory.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}
