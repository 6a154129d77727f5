//! Site building orchestration.
//!
//! # Stages
//!
//! ```text
//! build_site()
//!     │
//!     ├── clear_subdirs(output)   every subdirectory of the output root
//!     ├── post pages              xml/<address>/index.xml
//!     ├── tag pages               xml/<address>/index.xml
//!     ├── home index              xml/index.xml
//!     ├── copy_dir(statics)       mirrored into xml/
//!     └── apply_stylesheets()     one sibling tree per stylesheet
//! ```
//!
//! The first failing stage aborts the build; whatever was written stays.

use crate::{
    config::SiteConfig,
    content::Source,
    doc::{Element, write_document},
    log,
    registry::Id,
    render::{home_page, post_page, tag_page},
    taxonomy::Taxonomy,
    transform::apply_stylesheets,
    utils::fs::{clear_subdirs, copy_dir, ensure_dir},
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// File name of every generated page.
pub const PAGE_FILE: &str = "index.xml";

/// Render every page, copy statics and run the stylesheets.
pub fn build_site(config: &SiteConfig, source: &Source, taxonomy: &Taxonomy) -> Result<()> {
    let build = &config.build;
    let xml_dir = build.xml_dir();

    clear_subdirs(&build.output).context("Failed to clear output directory")?;
    ensure_dir(&xml_dir)?;

    for post in &source.posts {
        write_page(&xml_dir, Some(post.id), &post_page(post, taxonomy))
            .with_context(|| format!("Failed to build post {}", post.name))?;
    }

    for tag in taxonomy.tags() {
        write_page(&xml_dir, Some(tag.id), &tag_page(tag, source))
            .with_context(|| format!("Failed to build tag {}", tag.label))?;
    }

    write_page(&xml_dir, None, &home_page(&config.site.title, source, taxonomy))
        .context("Failed to build home index")?;

    log!(
        "build"; "{} posts, {} tags -> {}",
        source.len(), taxonomy.len(), xml_dir.display()
    );

    let copied = copy_dir(&build.statics, &xml_dir).context("Failed to copy static files")?;
    if copied > 0 {
        log!("statics"; "copied {} files", copied);
    }

    apply_stylesheets(build).context("Failed to apply stylesheets")?;

    Ok(())
}

/// Write `page` to `<xml_dir>/<address>/index.xml`, or to the tree root for
/// the home index.
fn write_page(xml_dir: &Path, id: Option<Id>, page: &Element) -> Result<PathBuf> {
    let dir = match id {
        Some(id) => xml_dir.join(id.to_string()),
        None => xml_dir.to_path_buf(),
    };
    ensure_dir(&dir)?;

    let path = dir.join(PAGE_FILE);
    write_document(&path, page)?;
    Ok(path)
}
