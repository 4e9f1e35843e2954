use std::path::Path;

use crate::error::Error;

/// Namespace prefix shared by every listing in the book.
const DEFAULT_NAMESPACE_ROOT: &str = "AddisonWesley.Michaelis.EssentialCSharp";

/// Listing file types recognised when no `extensions` key is configured.
const DEFAULT_EXTENSIONS: [&str; 2] = ["cs", "xml"];

/// Where a chapter's test listings live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestLayout {
    /// Tests sit next to listings and are marked by a `Tests` caption.
    SameDirectory,
    /// Tests live in a `Chapter<CC>.Tests` directory beside the chapter.
    #[default]
    Sibling,
}

/// Which move provider relocates renamed files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoverKind {
    /// Plain filesystem rename.
    #[default]
    Filesystem,
    /// `git mv`, so history records a rename.
    Git,
}

/// Project configuration loaded from `.listings.toml`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Approved listing extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// Provider used for renames unless overridden on the command line.
    pub mover: MoverKind,
    /// Namespace prefix before `.Chapter<CC>`.
    pub namespace_root: String,
    /// Where paired tests are found.
    pub tests: TestLayout,
}

/// Raw TOML structure for `.listings.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ListingsTomlConfig {
    #[serde(default)]
    extensions: Option<Vec<String>>,
    #[serde(default)]
    mover: MoverKind,
    #[serde(default)]
    namespace_root: Option<String>,
    #[serde(default)]
    tests: TestLayout,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| return (*e).to_string()).collect(),
            mover: MoverKind::default(),
            namespace_root: DEFAULT_NAMESPACE_ROOT.to_string(),
            tests: TestLayout::default(),
        };
    }
}

impl Config {
    /// Load config from `.listings.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config file the
    /// user wrote is never silently replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::InvalidConfig` if a value is unusable.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".listings.toml");
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content, filling unset keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed,
    /// or `Error::InvalidConfig` if a value is unusable.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: ListingsTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();

        let extensions: Vec<String> = raw
            .extensions
            .map(|exts| {
                return exts.into_iter().map(|e| return e.trim_start_matches('.').to_string()).collect();
            })
            .unwrap_or(defaults.extensions);
        if extensions.is_empty() || extensions.iter().any(String::is_empty) {
            return Err(Error::InvalidConfig {
                reason: "`extensions` must list at least one non-empty extension".to_string(),
            });
        }

        let namespace_root = raw.namespace_root.unwrap_or(defaults.namespace_root);
        if namespace_root.is_empty() || namespace_root.starts_with('.') || namespace_root.ends_with('.') {
            return Err(Error::InvalidConfig {
                reason: format!("`namespace_root` is not a dotted namespace: `{namespace_root}`"),
            });
        }

        return Ok(Self {
            extensions,
            mover: raw.mover,
            namespace_root,
            tests: raw.tests,
        });
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.namespace_root, DEFAULT_NAMESPACE_ROOT);
        assert_eq!(config.extensions, vec!["cs", "xml"]);
        assert_eq!(config.tests, TestLayout::Sibling);
        assert_eq!(config.mover, MoverKind::Filesystem);
    }

    #[test]
    fn reads_every_key() {
        let config = Config::parse(
            "namespace_root = \"Book\"\nextensions = [\".cs\", \"xaml\"]\ntests = \"same-directory\"\nmover = \"git\"\n",
        )
        .unwrap();
        assert_eq!(config.namespace_root, "Book");
        assert_eq!(config.extensions, vec!["cs", "xaml"]);
        assert_eq!(config.tests, TestLayout::SameDirectory);
        assert_eq!(config.mover, MoverKind::Git);
    }

    #[test]
    fn empty_extension_list_is_rejected() {
        let err = Config::parse("extensions = []\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".listings.toml"), "tests = \"elsewhere\"\n").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }
}
