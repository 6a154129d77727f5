//! Reading and writing the canonical tree as XML.
//!
//! Reading is strict about structure (balanced, matching tags) and lenient
//! about everything that carries no content: declarations, comments,
//! processing instructions and whitespace-only text between elements are
//! dropped.

use super::{Element, Node};
use anyhow::{Context, Result};
use quick_xml::{
    Reader, Writer,
    escape::unescape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use std::{fmt::Display, fs, path::Path, str};
use thiserror::Error;

/// Indentation used for every written page.
const INDENT: usize = 4;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML syntax error at position {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("unclosed element `<{0}>`")]
    Unclosed(String),

    #[error("expected exactly one root element, found {0}")]
    Root(usize),

    #[error("text outside of the root element")]
    StrayText,
}

// ============================================================================
// XML Reader
// ============================================================================

/// Create a configured XML reader over a string.
#[inline]
pub fn create_xml_reader(content: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = true;
    reader
}

/// Parse a complete document with a single root element.
pub fn parse_document(content: &str) -> Result<Element, XmlError> {
    let mut root = None;
    let mut roots = 0;
    for node in parse_nodes(content)? {
        match node {
            Node::Element(elem) => {
                roots += 1;
                root.get_or_insert(elem);
            }
            Node::Text(_) => return Err(XmlError::StrayText),
        }
    }
    match (root, roots) {
        (Some(root), 1) => Ok(root),
        (_, n) => Err(XmlError::Root(n)),
    }
}

/// Parse a sequence of sibling nodes (elements and text) without requiring a
/// single root, e.g. the HTML printed by the markdown converter.
pub fn parse_fragment(content: &str) -> Result<Vec<Node>, XmlError> {
    parse_nodes(content)
}

fn parse_nodes(content: &str) -> Result<Vec<Node>, XmlError> {
    let mut reader = create_xml_reader(content);
    let mut stack: Vec<Element> = Vec::new();
    let mut top: Vec<Node> = Vec::new();
    let mut pending = String::new();

    loop {
        let position = reader.buffer_position() as u64;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => return Err(syntax(reader.error_position() as u64, e)),
        };

        match event {
            Event::Start(elem) => {
                flush_text(&mut pending, &mut stack, &mut top);
                stack.push(read_element(&elem, position)?);
            }
            Event::Empty(elem) => {
                flush_text(&mut pending, &mut stack, &mut top);
                let elem = read_element(&elem, position)?;
                attach(Node::Element(elem), &mut stack, &mut top);
            }
            Event::End(_) => {
                flush_text(&mut pending, &mut stack, &mut top);
                let elem = stack
                    .pop()
                    .ok_or_else(|| syntax(position, "unmatched end tag"))?;
                attach(Node::Element(elem), &mut stack, &mut top);
            }
            Event::Text(text) => {
                let raw = str::from_utf8(&text).map_err(|e| syntax(position, e))?;
                pending.push_str(&unescape(raw).map_err(|e| syntax(position, e))?);
            }
            Event::CData(data) => {
                pending.push_str(str::from_utf8(&data).map_err(|e| syntax(position, e))?);
            }
            Event::GeneralRef(reference) => {
                let name = str::from_utf8(&reference).map_err(|e| syntax(position, e))?;
                let raw = format!("&{name};");
                pending.push_str(&unescape(&raw).map_err(|e| syntax(position, e))?);
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    flush_text(&mut pending, &mut stack, &mut top);
    Ok(top)
}

fn read_element(elem: &BytesStart<'_>, position: u64) -> Result<Element, XmlError> {
    let qname = elem.name();
    let name = str::from_utf8(qname.as_ref()).map_err(|e| syntax(position, e))?;
    let mut out = Element::new(name);
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| syntax(position, e))?;
        let key = str::from_utf8(attr.key.as_ref()).map_err(|e| syntax(position, e))?;
        let raw = str::from_utf8(attr.value.as_ref()).map_err(|e| syntax(position, e))?;
        let value = unescape(raw).map_err(|e| syntax(position, e))?;
        out.set_attr(key, value);
    }
    Ok(out)
}

/// Emit accumulated text as one node; whitespace-only runs are layout, not content.
fn flush_text(pending: &mut String, stack: &mut [Element], top: &mut Vec<Node>) {
    if pending.is_empty() {
        return;
    }
    let text = std::mem::take(pending);
    if text.trim().is_empty() {
        return;
    }
    match stack.last_mut() {
        Some(parent) => parent.push_text(text),
        None => top.push(Node::Text(text)),
    }
}

fn attach(node: Node, stack: &mut [Element], top: &mut Vec<Node>) {
    match stack.last_mut() {
        Some(parent) => parent.push(node),
        None => top.push(node),
    }
}

#[inline]
fn syntax(position: u64, message: impl Display) -> XmlError {
    XmlError::Syntax {
        position,
        message: message.to_string(),
    }
}

// ============================================================================
// XML Writer
// ============================================================================

pub type XmlWriter = Writer<Vec<u8>>;

/// Serialize a document with an XML declaration and 4-space indentation.
pub fn to_xml_string(root: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, root)?;
    let mut xml = String::from_utf8(writer.into_inner())?;
    xml.push('\n');
    Ok(xml)
}

/// Serialize `root` and write it to `path`.
pub fn write_document(path: &Path, root: &Element) -> Result<()> {
    let xml = to_xml_string(root)?;
    fs::write(path, xml).with_context(|| format!("Failed to write {}", path.display()))
}

fn write_element(writer: &mut XmlWriter, elem: &Element) -> Result<()> {
    let mut start = BytesStart::new(elem.name.as_str());
    for (key, value) in elem.attrs() {
        start.push_attribute((key, value));
    }

    if elem.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &elem.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(elem.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{BODY, BodyKind, DOCUMENT, META, TITLE, VALUE_ATTR};

    #[test]
    fn test_parse_document_structure() {
        let doc = parse_document(
            r#"<?xml version="1.0"?>
            <document>
                <meta><title value="Hi &amp; bye"/></meta>
                <body><bold>Bold</bold><text>a &lt; b</text></body>
            </document>"#,
        )
        .unwrap();

        assert_eq!(doc.name, DOCUMENT);
        let title = doc.child(META).and_then(|m| m.child(TITLE)).unwrap();
        assert_eq!(title.attr(VALUE_ATTR), Some("Hi & bye"));

        let body = doc.child(BODY).unwrap();
        assert_eq!(body.elements().count(), 2);
        assert_eq!(body.child("text").unwrap().text(), "a < b");
    }

    #[test]
    fn test_parse_document_keeps_mixed_text() {
        let doc = parse_document("<body>lead <bold>b</bold> tail</body>").unwrap();
        assert_eq!(doc.children.len(), 3);
        assert_eq!(doc.children[0].as_text(), Some("lead "));
        assert_eq!(doc.children[2].as_text(), Some(" tail"));
    }

    #[test]
    fn test_parse_document_rejects_multiple_roots() {
        let err = parse_document("<meta/><bold>x</bold>").unwrap_err();
        assert!(matches!(err, XmlError::Root(2)));
    }

    #[test]
    fn test_parse_document_rejects_mismatched_tags() {
        assert!(parse_document("<a><b></a></b>").is_err());
    }

    #[test]
    fn test_parse_document_rejects_unclosed() {
        assert!(parse_document("<document><body>").is_err());
    }

    #[test]
    fn test_parse_document_rejects_stray_text() {
        let err = parse_document("<meta/> trailing words").unwrap_err();
        assert!(matches!(err, XmlError::StrayText));
    }

    #[test]
    fn test_parse_fragment_allows_siblings() {
        let nodes = parse_fragment("<p>one</p>\n<pre><code>two</code></pre>\n").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].as_element().unwrap().text(), "two");
    }

    #[test]
    fn test_written_page_reads_back() {
        let page = Element::new(DOCUMENT)
            .with_child(
                Element::new(META)
                    .with_child(Element::new(TITLE).with_attr(VALUE_ATTR, "\"Quotes\" & <angles>")),
            )
            .with_child(
                Element::new(BODY)
                    .with_child(BodyKind::Bold.element().with_text("Hello"))
                    .with_child(BodyKind::Text.element()),
            );

        let xml = to_xml_string(&page).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("\n    <meta>"));
        assert!(xml.contains("<text/>"));

        assert_eq!(parse_document(&xml).unwrap(), page);
    }
}
