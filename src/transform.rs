//! Stylesheet transforms of the XML tree.
//!
//! Every `.xsl` file under `[build].styles` produces a sibling of the XML tree
//! named after the stylesheet: `styles/html.xsl` turns `output/xml/**/*.xml`
//! into `output/html/**/*.html`. Files that are not XML are copied as-is.

use crate::{
    config::{BuildConfig, Processor, TransformConfig},
    log,
    utils::{
        exec::{EMPTY_FILTER, exec, is_installed},
        fs::{collect_all_files, ensure_dir},
    },
};
use anyhow::{Context, Result, bail};
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

const STYLESHEET_EXT: &str = "xsl";
const PAGE_EXT: &str = "xml";

impl Processor {
    pub const fn program(self) -> &'static str {
        match self {
            Self::Xsltproc => "xsltproc",
            Self::Msxsl => "msxsl",
        }
    }

    fn command(self) -> Vec<String> {
        vec![self.program().to_owned()]
    }

    /// Arguments for one run; each processor has its own order.
    fn args(self, xsl: &Path, xml: &Path, dst: &Path) -> Vec<OsString> {
        let [xsl, xml, dst] = [xsl, xml, dst].map(OsString::from);
        let out = OsString::from("-o");
        match self {
            Self::Xsltproc => vec![out, dst, xsl, xml],
            Self::Msxsl => vec![xml, xsl, out, dst],
        }
    }

    /// Run `xsl` over `xml`, writing the result to `dst`.
    pub fn run(self, xsl: &Path, xml: &Path, dst: &Path) -> Result<()> {
        exec(&self.command(), &self.args(xsl, xml, dst), &EMPTY_FILTER)?;
        Ok(())
    }
}

/// The configured processor, or its fallback when the first is not installed.
pub fn resolve_processor(config: &TransformConfig) -> Result<Processor> {
    let candidates = std::iter::once(config.processor).chain(config.fallback);
    for processor in candidates {
        if is_installed(&processor.command()) {
            return Ok(processor);
        }
    }
    bail!(
        "no XSLT processor found, install `{}`",
        config.processor.program()
    )
}

/// A discovered stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    /// File stem; names the output tree and the page extension.
    pub name: String,
    pub path: PathBuf,
}

/// Find every `.xsl` file (any case) under `dir`, in file-name order.
pub fn discover_stylesheets(dir: &Path) -> Result<Vec<Stylesheet>> {
    let styles = collect_all_files(dir)?
        .into_iter()
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(STYLESHEET_EXT))
        })
        .filter_map(|path| {
            let name = path.file_stem()?.to_str()?.to_owned();
            Some(Stylesheet { name, path })
        })
        .collect();
    Ok(styles)
}

/// Apply every stylesheet to the XML tree. Returns the number applied.
pub fn apply_stylesheets(build: &BuildConfig) -> Result<usize> {
    let styles = discover_stylesheets(&build.styles)?;
    if styles.is_empty() {
        return Ok(0);
    }

    let processor = resolve_processor(&build.transform)?;
    let xml_dir = build.xml_dir();

    for style in &styles {
        if style.name == build.xml {
            bail!(
                "stylesheet {} would overwrite the XML tree",
                style.path.display()
            );
        }

        let dst = build.style_dir(&style.name);
        let pages = mirror_tree(&xml_dir, &dst, &style.name, |xml, out| {
            processor.run(&style.path, xml, out)
        })
        .with_context(|| format!("Failed to transform with {}", style.path.display()))?;

        log!("transform"; "{}: {} pages via {}", style.name, pages, processor.program());
    }

    Ok(styles.len())
}

/// Recreate the tree under `src` in `dst`.
///
/// XML pages go through `transform(src_file, dst_file)` with their extension
/// replaced by `ext`; every other file is copied. Returns the number of pages
/// transformed.
fn mirror_tree<F>(src: &Path, dst: &Path, ext: &str, mut transform: F) -> Result<usize>
where
    F: FnMut(&Path, &Path) -> Result<()>,
{
    let mut pages = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {}", src.display()))?;
        let path = entry.path();
        let target = dst.join(path.strip_prefix(src)?);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if is_page(path) {
            transform(path, &target.with_extension(ext))?;
            pages += 1;
        } else {
            fs::copy(path, &target).with_context(|| {
                format!("Failed to copy {} to {}", path.display(), target.display())
            })?;
        }
    }
    Ok(pages)
}

fn is_page(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PAGE_EXT))
}
