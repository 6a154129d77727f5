//! Loading posts from the posts directory.
//!
//! Every regular file under `[build].posts` is a post unless its name starts
//! with the ignore prefix. Files are visited in file-name order and each post
//! records its position in that walk as `order`.

use crate::{
    config::BuildConfig,
    doc::{Element, LABEL_ATTR, META, TAG, TITLE, VALUE_ATTR},
    log,
    markup::{CodeConverter, is_markup, parse_legacy, parse_markup},
    registry::{Id, Registry, RegistryError, post_key},
    taxonomy::Taxonomy,
};
use anyhow::{Context, Result};
use std::{fs, path::Path};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("no meta element found")]
    MissingMeta,

    #[error("no title element found in meta")]
    MissingTitle,

    #[error("title element has no value")]
    EmptyTitle,

    #[error("tag element has no label")]
    MissingLabel,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// A loaded post. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Post {
    /// Source file name, the stable part of the post's key.
    pub name: String,
    pub title: String,
    pub id: Id,
    /// Parsed document, rooted at `document` or (legacy) `meta`.
    pub content: Element,
    /// Tag identifiers in the order the tags appear in the post.
    pub tags: Vec<Id>,
    /// Zero-based position in the directory walk.
    pub order: usize,
}

/// All posts of one build, in discovery order.
#[derive(Debug, Default)]
pub struct Source {
    pub posts: Vec<Post>,
}

impl Source {
    pub fn find(&self, id: Id) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }
}

/// Load every post, assigning identifiers and collecting tags.
///
/// The first failing post aborts the whole load.
pub fn load_source(
    build: &BuildConfig,
    registry: &mut Registry,
    taxonomy: &mut Taxonomy,
    converter: &dyn CodeConverter,
) -> Result<Source> {
    let mut source = Source::default();

    for entry in WalkDir::new(&build.posts).sort_by_file_name() {
        let entry = entry.with_context(|| {
            format!("Failed to read posts directory {}", build.posts.display())
        })?;
        let path = entry.path();
        if entry.file_type().is_dir() || build.is_ignored(path) {
            continue;
        }

        let order = source.len();
        let post = load_post(path, order, registry, taxonomy, converter)
            .with_context(|| format!("Failed to load post {}", path.display()))?;

        if let Some(other) = source.find(post.id) {
            log!("warn"; "{} and {} share the address {}", other.name, post.name, post.id);
        }
        log!("posts"; "{} {}", post.id, post.title);
        source.posts.push(post);
    }

    Ok(source)
}

fn load_post(
    path: &Path,
    order: usize,
    registry: &mut Registry,
    taxonomy: &mut Taxonomy,
    converter: &dyn CodeConverter,
) -> Result<Post> {
    let raw = fs::read_to_string(path).context("Failed to read file")?;

    let content = if is_markup(&raw) {
        parse_markup(&raw, converter)?
    } else {
        parse_legacy(&raw)?
    };

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = registry.assure(&post_key(&name))?;

    let (title, tags) = process_meta(&content, id, registry, taxonomy)?;

    Ok(Post {
        name,
        title,
        id,
        content,
        tags,
        order,
    })
}

/// Extract the title and register the tags of a parsed post.
pub fn process_meta(
    document: &Element,
    post: Id,
    registry: &mut Registry,
    taxonomy: &mut Taxonomy,
) -> Result<(String, Vec<Id>), MetaError> {
    let meta = document.section(META).ok_or(MetaError::MissingMeta)?;

    let title = meta
        .child(TITLE)
        .ok_or(MetaError::MissingTitle)?
        .attr(VALUE_ATTR)
        .filter(|value| !value.is_empty())
        .ok_or(MetaError::EmptyTitle)?;

    let mut tags = Vec::new();
    for tag in meta.children_named(TAG) {
        let label = tag
            .attr(LABEL_ATTR)
            .filter(|label| !label.is_empty())
            .ok_or(MetaError::MissingLabel)?;
        tags.push(taxonomy.assure_label(registry, label, post)?);
    }

    Ok((title.to_owned(), tags))
}
