//! Page builders for posts, tags and the home index.
//!
//! Every page has the same shape as a post source:
//!
//! ```text
//! document
//! ├── meta
//! │   ├── title value="..."
//! │   └── tag   label="..." id="0x...."   (post pages only)
//! └── body
//! ```
//!
//! Links point at `/<address>/` and read `"<address> - <label>"`.

use crate::{
    content::{Post, Source},
    doc::{
        BODY, BodyKind, DOCUMENT, Element, HREF_ATTR, ID_ATTR, LABEL_ATTR, META, TAG, TITLE,
        VALUE_ATTR, copy_body,
    },
    registry::Id,
    taxonomy::{Tag, Taxonomy},
};

fn page(title: &str, meta_extra: Vec<Element>, body: Element) -> Element {
    let mut meta = Element::new(META).with_child(Element::new(TITLE).with_attr(VALUE_ATTR, title));
    for elem in meta_extra {
        meta.push(elem);
    }
    Element::new(DOCUMENT).with_child(meta).with_child(body)
}

/// A `link` to the page at `id`.
pub fn link(id: Id, label: &str) -> Element {
    BodyKind::Link
        .element()
        .with_attr(HREF_ATTR, id.href())
        .with_text(format!("{id} - {label}"))
}

/// Page for one post: title, links to its tags, then its allowed body content.
pub fn post_page(post: &Post, taxonomy: &Taxonomy) -> Element {
    let tags: Vec<&Tag> = post.tags.iter().filter_map(|&id| taxonomy.get(id)).collect();

    let meta_tags = tags
        .iter()
        .map(|tag| {
            Element::new(TAG)
                .with_attr(LABEL_ATTR, tag.label.as_str())
                .with_attr(ID_ATTR, tag.id.to_string())
        })
        .collect();

    let mut body = Element::new(BODY).with_child(BodyKind::Bold.element().with_text(&post.title));
    for tag in &tags {
        body.push(link(tag.id, &tag.label));
    }
    if let Some(source_body) = source_body(&post.content) {
        copy_body(source_body, &mut body);
    }

    page(&post.title, meta_tags, body)
}

/// The element whose children make up a post's body.
///
/// A `document` without a `body` wrapper holds its content next to `meta`;
/// `meta` itself is never a body element, so the root can be copied as is.
fn source_body(content: &Element) -> Option<&Element> {
    content
        .section(BODY)
        .or_else(|| (content.name == DOCUMENT).then_some(content))
}

/// Page for one tag: its label, then a link to every mentioning post.
pub fn tag_page(tag: &Tag, source: &Source) -> Element {
    let mut body = Element::new(BODY).with_child(BodyKind::Bold.element().with_text(&tag.label));
    for post in tag.mentions.iter().filter_map(|&id| source.find(id)) {
        body.push(link(post.id, &post.title));
    }
    page(&tag.label, Vec::new(), body)
}

/// Home index: posts then tags, each newest (highest address) first.
pub fn home_page(title: &str, source: &Source, taxonomy: &Taxonomy) -> Element {
    let mut posts: Vec<&Post> = source.posts.iter().collect();
    posts.sort_by(|a, b| b.id.cmp(&a.id));

    let mut tags: Vec<&Tag> = taxonomy.tags().iter().collect();
    tags.sort_by(|a, b| b.id.cmp(&a.id));

    let mut body = Element::new(BODY);
    for post in posts {
        body.push(link(post.id, &post.title));
    }
    // separator
    body.push(BodyKind::Text.element());
    for tag in tags {
        body.push(link(tag.id, &tag.label));
    }

    page(title, Vec::new(), body)
}
