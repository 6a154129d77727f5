//! Site configuration management for `petur.toml`.
//!
//! # Sections
//!
//! | Section             | Purpose                                  |
//! |---------------------|------------------------------------------|
//! | `[site]`            | Site metadata (title)                    |
//! | `[build]`           | Source, output and identifier store paths |
//! | `[build.markdown]`  | Converter for fenced code blocks         |
//! | `[build.transform]` | XSLT processor                           |
//!
//! The file is optional; without it every field takes its default.
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "My Notes"
//!
//! [build]
//! posts = "input/posts"
//! output = "output"
//!
//! [build.transform]
//! processor = "xsltproc"
//! ```

mod build;
pub mod defaults;
mod error;
mod site;

pub use build::{BuildConfig, MarkdownConfig, Processor, TransformConfig};
pub use error::ConfigError;
pub use site::SiteSection;

use crate::cli::Cli;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing petur.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub build: BuildConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load `petur.toml` (or the file named by `--config`) for the CLI
    /// invocation, falling back to defaults when it does not exist.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.build.posts, cli.posts.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.update_path_with_root(root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve every directory against `root` and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);
        let build = &mut self.build;

        for path in [
            &mut build.posts,
            &mut build.statics,
            &mut build.styles,
            &mut build.output,
            &mut build.lock,
        ] {
            *path = Self::normalize_path(&root.join(Self::expand_tilde(path)));
        }
        self.root = root;
    }

    /// Expand a leading `~` to the home directory
    fn expand_tilde(path: &Path) -> PathBuf {
        match path.to_str() {
            Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
            None => path.to_path_buf(),
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.build.markdown.command.is_empty() {
            bail!(ConfigError::Validation(
                "[build.markdown.command] must have at least one element".into()
            ));
        }

        if self.build.ignore_prefix.is_empty() {
            bail!(ConfigError::Validation(
                "[build.ignore_prefix] must not be empty".into()
            ));
        }

        let xml = &self.build.xml;
        if xml.is_empty() || xml.contains(['/', '\\']) {
            bail!(ConfigError::Validation(
                "[build.xml] must be a plain directory name".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use tempfile::TempDir;

    fn cli(root: &Path) -> Cli {
        Cli {
            root: Some(root.to_path_buf()),
            config: PathBuf::from("petur.toml"),
            posts: None,
            output: None,
            command: Commands::Build,
        }
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::load(&cli(dir.path())).unwrap();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.root, root);
        assert_eq!(config.build.posts, root.join("input/posts"));
        assert_eq!(config.build.lock, root.join("lock.xml"));
        assert_eq!(config.build.xml_dir(), root.join("output/xml"));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("petur.toml"),
            "[site]\ntitle = \"Notes\"\n[build]\noutput = \"public\"\n",
        )
        .unwrap();

        let config = SiteConfig::load(&cli(dir.path())).unwrap();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.site.title, "Notes");
        assert_eq!(config.build.output, root.join("public"));
        assert_eq!(config.config_path, root.join("petur.toml"));
    }

    #[test]
    fn test_cli_overrides_paths() {
        let dir = TempDir::new().unwrap();
        let mut cli = cli(dir.path());
        cli.posts = Some(PathBuf::from("drafts"));
        cli.output = Some(PathBuf::from("/tmp/petur-out"));

        let config = SiteConfig::load(&cli).unwrap();

        assert_eq!(config.build.posts, dir.path().canonicalize().unwrap().join("drafts"));
        assert_eq!(config.build.output, PathBuf::from("/tmp/petur-out"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("petur.toml"), "[build\n").unwrap();
        assert!(SiteConfig::load(&cli(dir.path())).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SiteConfig::default();
        assert!(config.validate().is_ok());

        config.build.xml = "a/b".into();
        assert!(config.validate().is_err());
        config.build.xml = String::new();
        assert!(config.validate().is_err());
        config.build.xml = "xml".into();

        config.build.ignore_prefix = String::new();
        assert!(config.validate().is_err());
        config.build.ignore_prefix = "~".into();

        config.build.markdown.command.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let plain = SiteConfig::expand_tilde(Path::new("input/posts"));
        assert_eq!(plain, PathBuf::from("input/posts"));

        let expanded = SiteConfig::expand_tilde(Path::new("~/posts"));
        assert!(!expanded.starts_with("~"));
    }
}
