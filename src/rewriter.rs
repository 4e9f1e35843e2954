//! Plan execution: move renamed files, replace their namespace declaration, and
//! rewrite references to renumbered listings in every file of the chapter.
//!
//! Files are treated as line-oriented text. References are recognised by shape
//! alone: `Listing<CC>_<LL><suffix>` (namespace style) and
//! `Listing<CC>.<LL><suffix>` (file-name style), either one optionally preceded
//! by the `Chapter<CC>.` namespace segment.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::Error;
use crate::listing::Identity;
use crate::mover::FileMover;
use crate::renumber::{Plan, PlanEntry};

/// Groups: chapter of the `Chapter<CC>.` segment (optional), chapter,
/// separator, number, suffix.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static REFERENCE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\b(?:Chapter(\d{2,})\.)?Listing(\d{2,})([._])(\d{2,})([A-Za-z]*)")
        .expect("valid reference regex");
});

/// Keyword opening the declaration replaced in moved files.
const NAMESPACE_KEYWORD: &str = "namespace";

/// UTF-8 byte order mark, common at the start of C# sources.
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// A file whose content could not be rewritten. The file keeps whatever path
/// the plan gave it.
#[derive(Debug, Clone)]
pub struct RewriteFailure {
    /// Path of the file at the time of the failure.
    pub path: PathBuf,
    /// The underlying error.
    pub reason: String,
}

/// What an execution did.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Content rewrites that failed after the moves succeeded.
    pub failures: Vec<RewriteFailure>,
    /// Destination of every completed move, in execution order.
    pub moved: Vec<PathBuf>,
    /// Files whose content was rewritten.
    pub rewritten: Vec<PathBuf>,
}

/// Replace the declared name on a `namespace` line, keeping a byte order mark,
/// indentation and whatever follows the name (`;`, `{`, comments). `None` if the
/// line is not a namespace declaration.
fn rewrite_namespace_declaration(line: &str, namespace: &str) -> Option<String> {
    let body = line.trim_start_matches(BYTE_ORDER_MARK);
    let bom = line.strip_suffix(body)?;
    let rest = body.trim_start().strip_prefix(NAMESPACE_KEYWORD)?;
    let name_and_tail = rest.trim_start();
    if name_and_tail.len() == rest.len() {
        return None;
    }

    let end = name_and_tail
        .find(|c: char| return c.is_whitespace() || c == ';' || c == '{')
        .unwrap_or(name_and_tail.len());
    let (name, tail) = name_and_tail.split_at(end);
    if name.is_empty() {
        return None;
    }

    let head = body.strip_suffix(name_and_tail)?;
    return Some(format!("{bom}{head}{namespace}{tail}"));
}

/// Render the token for `identity` with the separator of the matched token.
fn render_token(identity: &Identity, separator: &str) -> String {
    if separator == "_" {
        return identity.namespace_token();
    }
    return identity.file_stem();
}

/// Rewrite every reference token on `line` whose identity is renumbered.
/// All tokens are substituted in one pass, so a listing renumbered onto the
/// old number of another is never rewritten twice.
///
/// A `Chapter<CC>.` segment in front of the token follows the new chapter when
/// it named the old one, and is kept verbatim otherwise.
pub fn rewrite_references<'a>(line: &'a str, mapping: &BTreeMap<Identity, Identity>) -> Cow<'a, str> {
    if mapping.is_empty() {
        return Cow::Borrowed(line);
    }
    return REFERENCE_TOKEN.replace_all(line, |caps: &Captures<'_>| {
        let group = |i: usize| return caps.get(i).map_or("", |m| return m.as_str());
        let parsed = group(2)
            .parse::<u32>()
            .ok()
            .zip(group(4).parse::<u32>().ok())
            .map(|(chapter, number)| return Identity { chapter, number, suffix: group(5).to_string() });

        let Some((original, target)) = parsed.as_ref().and_then(|id| return mapping.get_key_value(id)) else {
            return group(0).to_string();
        };
        let token = render_token(target, group(3));
        let Some(segment) = caps.get(1) else {
            return token;
        };
        let chapter = if segment.as_str().parse::<u32>().ok() == Some(original.chapter) {
            target.chapter_segment()
        } else {
            format!("Chapter{}", segment.as_str())
        };
        return format!("{chapter}.{token}");
    });
}

/// Split a line from `split_inclusive('\n')` into its text and terminator.
fn split_line_terminator(piece: &str) -> (&str, &str) {
    if let Some(line) = piece.strip_suffix("\r\n") {
        return (line, "\r\n");
    }
    if let Some(line) = piece.strip_suffix('\n') {
        return (line, "\n");
    }
    return (piece, "");
}

/// Rewrite a file's content: the first namespace declaration gets `namespace`
/// (when given) and every renumbered reference gets its new token. Returns
/// `None` when nothing changes, so the file can be left untouched.
///
/// Every line keeps its own terminator. An unterminated last line gets the
/// terminator of the line before it, or LF in a one-line file.
pub fn rewrite_content(
    content: &str,
    namespace: Option<&str>,
    mapping: &BTreeMap<Identity, Identity>,
) -> Option<String> {
    let mut pending_namespace = namespace;
    let mut changed = false;
    let mut last_terminator = "\n";
    let mut output = String::with_capacity(content.len());

    for piece in content.split_inclusive('\n') {
        let (line, terminator) = split_line_terminator(piece);
        let declaration = pending_namespace.and_then(|ns| return rewrite_namespace_declaration(line, ns));
        let rewritten = if let Some(declared) = declaration {
            pending_namespace = None;
            Cow::Owned(declared)
        } else {
            rewrite_references(line, mapping)
        };

        changed = changed || rewritten != line;
        output.push_str(&rewritten);
        if !terminator.is_empty() {
            last_terminator = terminator;
        }
        output.push_str(last_terminator);
    }

    if !changed {
        return None;
    }
    return Some(output);
}

/// Rewrite one file on disk. Files that are not UTF-8 text are skipped.
///
/// # Errors
///
/// Returns the read or write failure.
fn rewrite_file(path: &Path, namespace: Option<&str>, mapping: &BTreeMap<Identity, Identity>) -> io::Result<bool> {
    let Some(updated) = rewritten_content_of(path, namespace, mapping)? else {
        return Ok(false);
    };
    std::fs::write(path, updated)?;
    return Ok(true);
}

/// Read `path` and compute its rewritten content, if any.
///
/// # Errors
///
/// Returns read failures other than invalid UTF-8.
fn rewritten_content_of(
    path: &Path,
    namespace: Option<&str>,
    mapping: &BTreeMap<Identity, Identity>,
) -> io::Result<Option<String>> {
    let content = match std::fs::read_to_string(path) {
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            tracing::debug!("skipping non-text file {}", path.display());
            return Ok(None);
        },
        Err(e) => return Err(e),
        Ok(c) => c,
    };
    return Ok(rewrite_content(&content, namespace, mapping));
}

/// Index plan entries by their current path.
fn entries_by_source<'p>(entries: impl IntoIterator<Item = &'p PlanEntry>) -> HashMap<&'p Path, &'p PlanEntry> {
    return entries.into_iter().map(|e| return (e.source.as_path(), e)).collect();
}

/// The part of `plan.mapping` whose files have all moved. An identity whose
/// listing moved but whose test did not (or the reverse) is left out.
fn completed_mapping(plan: &Plan, completed: &[&PlanEntry]) -> BTreeMap<Identity, Identity> {
    let moved: HashSet<&Path> = completed.iter().map(|e| return e.source.as_path()).collect();
    return plan
        .mapping
        .iter()
        .filter(|&(original, _)| {
            return plan
                .entries
                .iter()
                .filter(|e| return e.original == *original)
                .all(|e| return moved.contains(e.source.as_path()));
        })
        .map(|(original, target)| return (original.clone(), target.clone()))
        .collect();
}

/// Refuse the whole plan if a destination is taken by a file that no earlier
/// rename vacates. Nothing has moved when this fails.
///
/// # Errors
///
/// Returns `Error::MoveFailed` with no renames applied.
fn check_destinations(order: &[&PlanEntry]) -> Result<(), Error> {
    let mut vacated: HashSet<&Path> = HashSet::new();
    for entry in order {
        if entry.destination.exists() && !vacated.contains(entry.destination.as_path()) {
            return Err(Error::MoveFailed {
                completed: 0,
                destination: entry.destination.clone(),
                origin: entry.source.clone(),
                reason: "destination already exists".to_string(),
                rewritten: 0,
            });
        }
        vacated.insert(entry.source.as_path());
    }
    return Ok(());
}

/// Rewrite namespaces of the `moved` entries and references from `mapping`
/// across the snapshot `files`, recording results in `outcome`.
fn rewrite_snapshot(
    moved: &[&PlanEntry],
    mapping: &BTreeMap<Identity, Identity>,
    files: &[PathBuf],
    outcome: &mut Outcome,
) {
    let by_source = entries_by_source(moved.iter().copied());
    for file in files {
        let (path, namespace) = match by_source.get(file.as_path()) {
            None => (file.as_path(), None),
            Some(entry) => (entry.destination.as_path(), Some(entry.namespace.as_str())),
        };
        match rewrite_file(path, namespace, mapping) {
            Err(e) => {
                tracing::warn!("could not rewrite {}: {e}", path.display());
                outcome.failures.push(RewriteFailure { path: path.to_path_buf(), reason: e.to_string() });
            },
            Ok(false) => {},
            Ok(true) => {
                tracing::debug!("rewrote {}", path.display());
                outcome.rewritten.push(path.to_path_buf());
            },
        }
    }
}

/// Files in `files` (a pre-run snapshot) whose content the plan would change,
/// by current path. Reads only.
///
/// # Errors
///
/// Returns `Error::Io` if a text file cannot be read.
pub fn pending_rewrites(plan: &Plan, files: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
    let by_source = entries_by_source(&plan.entries);
    let mut pending = Vec::new();
    for file in files {
        let namespace = by_source.get(file.as_path()).map(|e| return e.namespace.as_str());
        if rewritten_content_of(file, namespace, &plan.mapping)?.is_some() {
            pending.push(file.clone());
        }
    }
    return Ok(pending);
}

/// Executes plans through an injected move provider.
pub struct Rewriter<'a> {
    /// Provider that performs each rename.
    mover: &'a dyn FileMover,
}

impl<'a> Rewriter<'a> {
    /// Create a rewriter that moves files with `mover`.
    pub fn new(mover: &'a dyn FileMover) -> Self {
        return Self { mover };
    }

    /// Run every rename in collision-free order, then rewrite namespaces and
    /// references across `files`, the snapshot taken when the catalog was built.
    ///
    /// Destinations are checked before the first rename. If the provider fails
    /// part way, the renames already applied stay, and the snapshot is still
    /// rewritten for them alone, so the chapter is consistent with its file
    /// names and a later run can finish the job.
    ///
    /// # Errors
    ///
    /// Returns `Error::MoveFailed` when a destination is taken or the provider
    /// fails. Rewrite failures are not errors; they are collected in
    /// `Outcome::failures`.
    pub fn execute(&self, plan: &Plan, files: &[PathBuf]) -> Result<Outcome, Error> {
        let order = plan.execution_order();
        check_destinations(&order)?;

        let mut outcome = Outcome::default();
        let mut completed: Vec<&PlanEntry> = Vec::new();
        let mut failure = None;

        for entry in order {
            let kind = if entry.is_test { "test" } else { "listing" };
            tracing::info!("rename {kind} {} -> {}", entry.source.display(), entry.destination.display());
            if let Err(reason) = self.move_entry(entry) {
                failure = Some((entry, reason));
                break;
            }
            outcome.moved.push(entry.destination.clone());
            completed.push(entry);
        }

        let Some((entry, reason)) = failure else {
            rewrite_snapshot(&completed, &plan.mapping, files, &mut outcome);
            return Ok(outcome);
        };

        let mapping = completed_mapping(plan, &completed);
        rewrite_snapshot(&completed, &mapping, files, &mut outcome);
        return Err(Error::MoveFailed {
            completed: completed.len(),
            destination: entry.destination.clone(),
            origin: entry.source.clone(),
            reason,
            rewritten: outcome.rewritten.len(),
        });
    }

    /// Move one entry, refusing to overwrite an existing file.
    ///
    /// # Errors
    ///
    /// Returns the reason the move did not happen.
    fn move_entry(&self, entry: &PlanEntry) -> Result<(), String> {
        if entry.destination.exists() {
            return Err("destination already exists".to_string());
        }
        return self.mover.move_file(&entry.source, &entry.destination).map_err(|e| return e.to_string());
    }
}
