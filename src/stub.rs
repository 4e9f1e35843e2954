//! Generated test stubs for listings that have no test yet.

use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, Entry};
use crate::scan;

/// Stub body. `{namespace}` is the only placeholder.
const TEMPLATE: &str = "\
namespace {namespace};

[TestClass]
public class ProgramTests
{
    [TestMethod]
    public void Main_Placeholder()
    {
        Assert.Fail(\"Test not yet written.\");
    }
}
";

/// Renders stubs under one namespace root.
#[derive(Debug, Clone)]
pub struct StubTemplate {
    /// Namespace prefix before `.Chapter<CC>`.
    namespace_root: String,
}

impl StubTemplate {
    /// Template for the book rooted at `namespace_root`.
    pub fn new(namespace_root: &str) -> Self {
        return Self { namespace_root: namespace_root.to_string() };
    }

    /// `Listing<CC>.<LL>.Tests.cs`.
    pub fn file_name(chapter: u32, number: u32) -> String {
        return format!("Listing{chapter:02}.{number:02}.Tests.cs");
    }

    /// Stub content for listing `chapter.number`.
    pub fn render(&self, chapter: u32, number: u32) -> String {
        let namespace = format!(
            "{}.Chapter{chapter:02}.Listing{chapter:02}_{number:02}.Tests",
            self.namespace_root
        );
        return TEMPLATE.replace("{namespace}", &namespace);
    }
}

/// Where each missing test stub would be written for `catalog`. Extra
/// listings get no stub; they are reported, not paired.
pub fn planned_stubs(catalog: &Catalog) -> Vec<(&Entry, PathBuf)> {
    return catalog
        .entries
        .iter()
        .filter(|e| return catalog.test_for(e).is_none() && !scan::is_extra_listing(&e.listing))
        .map(|e| {
            let id = &e.listing.identity;
            return (e, catalog.test_dir.join(StubTemplate::file_name(id.chapter, id.number)));
        })
        .collect();
}

/// Write a stub at `path` unless a file is already there. Returns whether it
/// was written.
///
/// # Errors
///
/// Returns the I/O error from creating the directory or writing the file.
pub fn write_stub(path: &Path, content: &str) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, content)?;
    return Ok(true);
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::config::TestLayout;

    #[test]
    fn renders_padded_namespace() {
        let stub = StubTemplate::new("Book").render(3, 7);
        assert!(stub.starts_with("namespace Book.Chapter03.Listing03_07.Tests;\n"));
        assert!(stub.contains("Assert.Fail"));
        assert_eq!(StubTemplate::file_name(3, 7), "Listing03.07.Tests.cs");
    }

    #[test]
    fn plans_stubs_only_for_untested_canonical_listings() {
        let book = tempfile::tempdir().unwrap();
        let chapter = book.path().join("Chapter05");
        let tests = book.path().join("Chapter05.Tests");
        std::fs::create_dir_all(&chapter).unwrap();
        std::fs::create_dir_all(&tests).unwrap();
        for name in ["Listing05.01.cs", "Listing05.02.cs", "Listing05.02A.cs"] {
            std::fs::write(chapter.join(name), "").unwrap();
        }
        std::fs::write(tests.join("Listing05.01.Tests.cs"), "").unwrap();

        let catalog = Catalog::load(&chapter, TestLayout::Sibling, &["cs".to_string()]).unwrap();
        let planned: Vec<PathBuf> = planned_stubs(&catalog).into_iter().map(|(_, p)| return p).collect();
        assert_eq!(planned, vec![catalog.test_dir.join("Listing05.02.Tests.cs")]);
    }

    #[test]
    fn existing_files_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Chapter01.Tests/Listing01.01.Tests.cs");
        assert!(write_stub(&path, "first").unwrap());
        assert!(!write_stub(&path, "second").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
    }
}
