//! XML posts.
//!
//! Current posts are a single `document` (or bare `meta`) root. Older posts
//! are a `meta` element followed by loose body content; those are wrapped
//! into a `document` at the `</meta>` boundary before parsing.

use crate::doc::{BODY, DOCUMENT, Element, parse_document, xml::XmlError};

const META_END: &str = "</meta>";

/// Parse an XML post, wrapping the loose legacy form when needed.
pub fn parse_legacy(content: &str) -> Result<Element, XmlError> {
    let err = match parse_document(content) {
        Ok(doc) => return Ok(doc),
        Err(err) => err,
    };

    let Some(pos) = content.find(META_END) else {
        return Err(err);
    };
    let (meta, rest) = content.split_at(pos + META_END.len());

    let wrapped = format!("<{DOCUMENT}>{meta}<{BODY}>{rest}</{BODY}></{DOCUMENT}>");
    parse_document(&wrapped)
}
