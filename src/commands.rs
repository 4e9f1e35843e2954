//! CLI commands: update, scan, stub.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::catalog::Catalog;
use crate::config::{Config, MoverKind};
use crate::error;
use crate::mover;
use crate::renumber::{self, Mode, Plan};
use crate::rewriter::{self, Outcome, Rewriter};
use crate::scan;
use crate::stub::{self, StubTemplate};

/// Output format for `scan`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// The report serialized as JSON.
    Json,
    /// One line per finding (default).
    #[default]
    Text,
}

/// Flags for `update`.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateOptions {
    /// Take the chapter number from the directory name.
    pub by_folder: bool,
    /// Replace only the chapter number.
    pub chapter_only: bool,
    /// Use `git mv` regardless of configuration.
    pub git: bool,
    /// Print the plan without touching anything.
    pub preview: bool,
}

/// `path` relative to the directory holding the chapter, for display.
fn display_path<'a>(catalog: &Catalog, path: &'a Path) -> std::path::Display<'a> {
    let base = catalog.chapter_dir.parent().unwrap_or(catalog.chapter_dir.as_path());
    return path.strip_prefix(base).unwrap_or(path).display();
}

/// Print what `update` would do.
///
/// # Errors
///
/// Returns `Error::Io` if a file cannot be read while computing rewrites.
fn print_preview(catalog: &Catalog, plan: &Plan) -> Result<(), error::Error> {
    for entry in plan.execution_order() {
        println!(
            "RENAME   {} -> {}",
            display_path(catalog, &entry.source),
            display_path(catalog, &entry.destination)
        );
    }
    for file in rewriter::pending_rewrites(plan, &catalog.files)? {
        println!("REWRITE  {}", display_path(catalog, &file));
    }
    return Ok(());
}

/// Print a summary of an executed plan, including every rewrite failure.
fn print_outcome(catalog: &Catalog, outcome: &Outcome) {
    for failure in &outcome.failures {
        eprintln!("FAILED   {} ({})", display_path(catalog, &failure.path), failure.reason);
    }
    let moved = outcome.moved.len();
    let rewritten = outcome.rewritten.len();
    eprintln!("Renamed {moved} files, rewrote {rewritten} files");
    if !outcome.failures.is_empty() {
        eprintln!("{} files could not be rewritten", outcome.failures.len());
    }
    return;
}

/// Scan a chapter or a whole book and print the findings.
/// Exits 1 when anything is reported.
///
/// # Errors
///
/// Returns errors from config loading, catalog construction, or JSON output.
pub fn scan(path: &Path, format: ReportFormat) -> Result<ExitCode, error::Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let report = scan::scan(path, &config)?;

    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => {
            for finding in &report.findings {
                println!("{finding}");
            }
            let findings = report.findings.len();
            let chapters = report.chapters.len();
            eprintln!("{findings} findings in {chapters} chapters");
        },
    }

    if report.is_clean() {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::from(1));
}

/// Write a generated test stub for every untested canonical listing.
/// Existing files are never overwritten.
///
/// # Errors
///
/// Returns errors from config loading, catalog construction, or writing stubs.
pub fn stub(path: &Path, preview: bool) -> Result<(), error::Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let template = StubTemplate::new(&config.namespace_root);
    let mut created = 0_usize;

    for dir in scan::chapter_dirs(path)? {
        let catalog = Catalog::load(&dir, config.tests, &config.extensions)?;
        for (entry, destination) in stub::planned_stubs(&catalog) {
            let shown = display_path(&catalog, &destination);
            if preview {
                println!("CREATE   {shown}");
                continue;
            }
            let id = &entry.listing.identity;
            if stub::write_stub(&destination, &template.render(id.chapter, id.number))? {
                println!("CREATED  {shown}");
                created = created.saturating_add(1);
            } else {
                tracing::warn!("{shown} already exists, not overwriting");
            }
        }
    }

    if !preview {
        eprintln!("Created {created} test stubs");
    }
    return Ok(());
}

/// Renumber one chapter: move files, rewrite namespaces and references.
/// Exits 1 when a content rewrite failed after the moves.
///
/// # Errors
///
/// Returns errors from config loading, catalog construction, planning, or
/// the first failed move.
pub fn update(path: &Path, options: UpdateOptions) -> Result<ExitCode, error::Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let catalog = Catalog::load(path, config.tests, &config.extensions)?;

    let mode = if options.chapter_only { Mode::ChapterOnly } else { Mode::Full };
    let renumber_options = renumber::Options { by_folder: options.by_folder, mode };
    let plan = renumber::plan(&catalog, renumber_options, &config.namespace_root)?;

    if plan.is_empty() {
        eprintln!("Nothing to renumber in {}", catalog.chapter_dir.display());
        return Ok(ExitCode::SUCCESS);
    }

    if options.preview {
        print_preview(&catalog, &plan)?;
        return Ok(ExitCode::SUCCESS);
    }

    let kind = if options.git { MoverKind::Git } else { config.mover };
    let mover = mover::for_kind(kind);
    let outcome = Rewriter::new(mover.as_ref()).execute(&plan, &catalog.files)?;
    print_outcome(&catalog, &outcome);

    if outcome.failures.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::from(1));
}
