//! Canonical document model.
//!
//! A single tree type is shared by parsed post content and by every generated
//! page, so the loader, the renderer and the XML reader/writer all speak the
//! same vocabulary.
//!
//! # Shape of a post
//!
//! ```text
//! document
//! ├── meta
//! │   ├── title  value="..."
//! │   └── tag    label="..."   (zero or more)
//! └── body
//!     └── bold | text | item | link | code | raw text   (ordered)
//! ```

pub mod xml;

pub use xml::{parse_document, parse_fragment, to_xml_string, write_document};

// ============================================================================
// Element Names
// ============================================================================

pub const DOCUMENT: &str = "document";
pub const META: &str = "meta";
pub const BODY: &str = "body";
pub const TITLE: &str = "title";
pub const TAG: &str = "tag";

/// Attribute carrying the title text on `meta/title`.
pub const VALUE_ATTR: &str = "value";
/// Attribute carrying the tag label on `meta/tag`.
pub const LABEL_ATTR: &str = "label";
/// Attribute carrying the link target on `link`.
pub const HREF_ATTR: &str = "href";
/// Attribute carrying a tag address on generated `meta/tag`.
pub const ID_ATTR: &str = "id";

// ============================================================================
// Body Elements
// ============================================================================

/// The closed set of element kinds allowed directly under `body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Bold,
    Text,
    Item,
    Link,
    Code,
}

impl BodyKind {
    pub const ALL: [Self; 5] = [Self::Bold, Self::Text, Self::Item, Self::Link, Self::Code];

    /// Element name used in the canonical tree.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Text => "text",
            Self::Item => "item",
            Self::Link => "link",
            Self::Code => "code",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Create an empty element of this kind.
    pub fn element(self) -> Element {
        Element::new(self.tag())
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A node of the canonical tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(elem) => Some(elem),
            Self::Text(_) => None,
        }
    }

    #[cfg(test)]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(elem: Element) -> Self {
        Self::Element(elem)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// An element: a name, uniquely keyed attributes in insertion order, and
/// ordered children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attr`].
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`Element::push_text`].
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    /// Builder form of [`Element::push`].
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.push(child);
        self
    }

    /// Set an attribute, replacing the value if the key already exists.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Append a new child element and return a handle to it.
    pub fn push_element(&mut self, name: impl Into<String>) -> &mut Element {
        self.children.push(Node::Element(Element::new(name)));
        match self.children.last_mut() {
            Some(Node::Element(elem)) => elem,
            _ => unreachable!("an element was just pushed"),
        }
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|elem| elem.name == name)
    }

    /// All child elements with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |elem| elem.name == name)
    }

    /// Concatenated text of all descendant text nodes.
    #[cfg(test)]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    #[cfg(test)]
    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(elem) => elem.collect_text(out),
            }
        }
    }

    /// Locate `name` either on this element itself or directly beneath it.
    ///
    /// Posts may be rooted at `document` (with `meta`/`body` children) or, in
    /// the legacy form, at `meta` itself.
    pub fn section(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            Some(self)
        } else {
            self.child(name)
        }
    }
}

/// Copy the allowed children of `src` into `dst`.
///
/// Elements whose name is a [`BodyKind`] are deep-copied with all attributes
/// and descendants; text nodes are kept; every other element is dropped.
pub fn copy_body(src: &Element, dst: &mut Element) {
    for child in &src.children {
        match child {
            Node::Element(elem) if BodyKind::from_tag(&elem.name).is_some() => {
                dst.push(elem.clone());
            }
            Node::Element(_) => {}
            Node::Text(text) => dst.push_text(text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_kind_round_trip_names() {
        for kind in BodyKind::ALL {
            assert_eq!(BodyKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(BodyKind::from_tag("script"), None);
        assert_eq!(BodyKind::from_tag("Bold"), None);
    }

    #[test]
    fn test_set_attr_keeps_keys_unique() {
        let mut elem = Element::new("link").with_attr("href", "/a/");
        elem.set_attr("href", "/b/");
        elem.set_attr("rel", "x");

        assert_eq!(elem.attr("href"), Some("/b/"));
        assert_eq!(elem.attrs().count(), 2);
        assert_eq!(elem.attr("missing"), None);
    }

    #[test]
    fn test_push_element_returns_child() {
        let mut root = Element::new(DOCUMENT);
        root.push_element(META)
            .push_element(TITLE)
            .set_attr(VALUE_ATTR, "Hello");

        let title = root.child(META).and_then(|m| m.child(TITLE)).unwrap();
        assert_eq!(title.attr(VALUE_ATTR), Some("Hello"));
    }

    #[test]
    fn test_children_named_in_order() {
        let meta = Element::new(META)
            .with_child(Element::new(TAG).with_attr(LABEL_ATTR, "a"))
            .with_child(Element::new(TITLE))
            .with_child(Element::new(TAG).with_attr(LABEL_ATTR, "b"));

        let labels: Vec<_> = meta
            .children_named(TAG)
            .filter_map(|t| t.attr(LABEL_ATTR))
            .collect();
        assert_eq!(labels, ["a", "b"]);
    }

    #[test]
    fn test_text_concatenates_descendants() {
        let elem = Element::new("code")
            .with_text("a")
            .with_child(Element::new("pre").with_text("b"))
            .with_text("c");
        assert_eq!(elem.text(), "abc");
    }

    #[test]
    fn test_section_accepts_root_or_child() {
        let meta = Element::new(META);
        assert_eq!(meta.section(META).map(|m| m.name.as_str()), Some(META));

        let doc = Element::new(DOCUMENT).with_child(Element::new(META));
        assert!(doc.section(META).is_some());
        assert!(doc.section(BODY).is_none());
    }

    #[test]
    fn test_copy_body_filters_unknown_elements() {
        let body = Element::new(BODY)
            .with_child(BodyKind::Bold.element().with_text("Title"))
            .with_child(Element::new("script").with_text("alert(1)"))
            .with_text("loose")
            .with_child(
                BodyKind::Link
                    .element()
                    .with_attr(HREF_ATTR, "https://example.com")
                    .with_child(Element::new("em").with_text("deep")),
            );

        let mut out = Element::new(BODY);
        copy_body(&body, &mut out);

        let names: Vec<_> = out.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["bold", "link"]);
        assert_eq!(out.children[1].as_text(), Some("loose"));

        // Nested content of allowed elements is copied verbatim.
        let link = out.child("link").unwrap();
        assert_eq!(link.attr(HREF_ATTR), Some("https://example.com"));
        assert_eq!(link.child("em").map(Element::text), Some("deep".into()));
    }
}
