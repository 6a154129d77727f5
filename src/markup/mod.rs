//! Line-oriented post markup.
//!
//! ````text
//! title: 'Post title'
//! tags: ['rust', "xml"]
//! # Heading line            -> bold
//! - list entry              -> item
//! > https://example.com Ex  -> link (text defaults to the href)
//! ```                       -> code (fenced, converted to HTML)
//! anything else             -> text, joined until a blank or prefixed line
//! ````
//!
//! Posts whose first line is not a title declaration are XML, see [`legacy`].

pub mod code;
pub mod legacy;

pub use code::{CodeConverter, CommandConverter};
pub use legacy::parse_legacy;

use crate::{
    doc::{
        BODY, BodyKind, DOCUMENT, Element, HREF_ATTR, LABEL_ATTR, META, TAG, TITLE, VALUE_ATTR,
    },
    log,
};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// First-line prefix selecting this markup over XML.
pub const METADATA_PREFIX: &str = "title:";

/// Number of leading metadata lines (title, tags).
const METADATA_LINES: usize = 2;

const FENCE: &str = "```";
const BOLD_PREFIX: &str = "# ";
const ITEM_PREFIX: &str = "- ";
const LINK_PREFIX: &str = "> ";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"title:[ \t]*['"]([^'"]+)['"]"#).unwrap());
static TAGS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"tags:[ \t]*\[(.*?)\]").unwrap());
static TAG_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("file must have at least 2 lines for metadata")]
    TooShort,

    #[error("invalid title line, expected: title: 'title'")]
    Title,

    #[error("invalid tags line, expected: tags: ['tag1', 'tag2']")]
    Tags,

    #[error("unclosed code block starting at line {0}")]
    UnclosedCode(usize),
}

/// Whether `content` is written in the line markup rather than XML.
pub fn is_markup(content: &str) -> bool {
    content
        .split('\n')
        .next()
        .is_some_and(|line| line.trim().starts_with(METADATA_PREFIX))
}

/// Parse markup into a `document` with `meta` and `body`.
pub fn parse_markup(content: &str, converter: &dyn CodeConverter) -> Result<Element, MarkupError> {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.len() < METADATA_LINES {
        return Err(MarkupError::TooShort);
    }

    let (title, tags) = parse_metadata(lines[0], lines[1])?;

    let mut document = Element::new(DOCUMENT);
    let meta = document.push_element(META);
    meta.push_element(TITLE).set_attr(VALUE_ATTR, title);
    for label in tags {
        meta.push_element(TAG).set_attr(LABEL_ATTR, label);
    }

    let body = document.push_element(BODY);
    parse_body(&lines[METADATA_LINES..], body, converter)?;

    Ok(document)
}

fn parse_metadata<'a>(
    title_line: &'a str,
    tags_line: &'a str,
) -> Result<(&'a str, Vec<&'a str>), MarkupError> {
    let title = TITLE_RE
        .captures(title_line)
        .and_then(|caps| caps.get(1))
        .ok_or(MarkupError::Title)?
        .as_str();

    let list = TAGS_RE
        .captures(tags_line)
        .and_then(|caps| caps.get(1))
        .ok_or(MarkupError::Tags)?
        .as_str();

    let tags = TAG_ITEM_RE
        .captures_iter(list)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    Ok((title, tags))
}

// ============================================================================
// Body
// ============================================================================

/// A trimmed body line, classified by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Fence,
    Bold(&'a str),
    Item(&'a str),
    Link(&'a str),
    Plain(&'a str),
    Blank,
}

impl<'a> Line<'a> {
    fn classify(raw: &'a str) -> Self {
        let line = raw.trim();
        if line.starts_with(FENCE) {
            Self::Fence
        } else if let Some(rest) = line.strip_prefix(BOLD_PREFIX) {
            Self::Bold(rest)
        } else if let Some(rest) = line.strip_prefix(ITEM_PREFIX) {
            Self::Item(rest)
        } else if let Some(rest) = line.strip_prefix(LINK_PREFIX) {
            Self::Link(rest)
        } else if line.is_empty() {
            Self::Blank
        } else {
            Self::Plain(line)
        }
    }
}

fn parse_body(
    lines: &[&str],
    body: &mut Element,
    converter: &dyn CodeConverter,
) -> Result<(), MarkupError> {
    let mut i = 0;
    while i < lines.len() {
        match Line::classify(lines[i]) {
            Line::Fence => {
                let (code, next) = parse_code_block(lines, i, converter)?;
                body.push(code);
                i = next;
                continue;
            }
            Line::Bold(text) => body.push(BodyKind::Bold.element().with_text(text)),
            Line::Item(text) => body.push(BodyKind::Item.element().with_text(text)),
            Line::Link(rest) => {
                let mut parts = rest.split_whitespace();
                if let Some(href) = parts.next() {
                    let label: Vec<&str> = parts.collect();
                    let label = if label.is_empty() { href.to_owned() } else { label.join(" ") };
                    body.push(
                        BodyKind::Link
                            .element()
                            .with_attr(HREF_ATTR, href)
                            .with_text(label),
                    );
                }
            }
            Line::Plain(first) => {
                let mut paragraph = vec![first];
                i += 1;
                while let Some(Line::Plain(next)) = lines.get(i).map(|l| Line::classify(l)) {
                    paragraph.push(next);
                    i += 1;
                }
                body.push(BodyKind::Text.element().with_text(paragraph.join("\n")));
                continue;
            }
            Line::Blank => {}
        }
        i += 1;
    }
    Ok(())
}

/// Parse the fenced block opening at `start`; returns the `code` element and
/// the index of the first line after the closing fence.
fn parse_code_block(
    lines: &[&str],
    start: usize,
    converter: &dyn CodeConverter,
) -> Result<(Element, usize), MarkupError> {
    // 1-based line in the source file, metadata included
    let file_line = start + METADATA_LINES + 1;

    let end = (start + 1..lines.len())
        .find(|&j| Line::classify(lines[j]) == Line::Fence)
        .ok_or(MarkupError::UnclosedCode(file_line))?;

    let source = lines[start + 1..end].join("\n");
    let mut code = BodyKind::Code.element();

    match converter.convert(&source) {
        Ok(nodes) => code.children = nodes,
        Err(e) => {
            log!("warn"; "code block at line {file_line} kept as raw source: {e:#}");
            if !source.is_empty() {
                code.push_text(source);
            }
        }
    }

    Ok((code, end + 1))
}
