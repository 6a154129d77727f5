//! `[build]` section configuration.
//!
//! Contains source and output paths plus the two external tools: the markdown
//! converter used for code blocks and the stylesheet processor.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Enums
// ============================================================================

/// XSLT processor used by the transform stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Processor {
    /// libxslt's `xsltproc`.
    Xsltproc,
    /// Microsoft's `msxsl`.
    Msxsl,
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in petur.toml.
///
/// # Example
/// ```toml
/// [build]
/// posts = "input/posts"
/// output = "output"
///
/// [build.markdown]
/// command = ["pandoc", "-f", "markdown", "-t", "html"]
///
/// [build.transform]
/// processor = "xsltproc"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Post sources walked by the loader.
    #[serde(default = "defaults::build::posts")]
    #[educe(Default = defaults::build::posts())]
    pub posts: PathBuf,

    /// Files mirrored verbatim into the XML tree.
    #[serde(default = "defaults::build::statics")]
    #[educe(Default = defaults::build::statics())]
    pub statics: PathBuf,

    /// Directory searched for `.xsl` stylesheets.
    #[serde(default = "defaults::build::styles")]
    #[educe(Default = defaults::build::styles())]
    pub styles: PathBuf,

    /// Output root. Its subdirectories are removed on every build.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Name of the XML tree directory inside `output`.
    #[serde(default = "defaults::build::xml")]
    #[educe(Default = defaults::build::xml())]
    pub xml: String,

    /// Identifier store.
    #[serde(default = "defaults::build::lock")]
    #[educe(Default = defaults::build::lock())]
    pub lock: PathBuf,

    /// Post files whose name starts with this are skipped.
    #[serde(default = "defaults::build::ignore_prefix")]
    #[educe(Default = defaults::build::ignore_prefix())]
    pub ignore_prefix: String,

    #[serde(default)]
    pub markdown: MarkdownConfig,

    #[serde(default)]
    pub transform: TransformConfig,
}

impl BuildConfig {
    /// Root of the generated XML tree.
    pub fn xml_dir(&self) -> PathBuf {
        self.output.join(&self.xml)
    }

    /// Output directory for the stylesheet named `style`.
    pub fn style_dir(&self, style: &str) -> PathBuf {
        self.output.join(style)
    }

    /// Whether a post file should be skipped by name.
    pub fn is_ignored(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&self.ignore_prefix))
    }
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.markdown]` section - converter for fenced code blocks.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Command and leading arguments; the input file is appended.
    #[serde(default = "defaults::build::markdown::command")]
    #[educe(Default = defaults::build::markdown::command())]
    pub command: Vec<String>,

    /// Alternate command tried when `command` is not installed.
    #[serde(default)]
    pub fallback: Vec<String>,
}

/// `[build.transform]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    #[serde(default = "defaults::build::transform::processor")]
    #[educe(Default = defaults::build::transform::processor())]
    pub processor: Processor,

    /// Processor tried when `processor` is not installed.
    #[serde(default = "defaults::build::transform::fallback")]
    #[educe(Default = defaults::build::transform::fallback())]
    pub fallback: Option<Processor>,
}
