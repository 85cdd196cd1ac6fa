//! XML processing utilities.
//!
//! The markup converter emits XHTML-style fragments. This module turns such a
//! fragment into a small owned element tree so the structure fixer can move
//! and retag nodes, then writes the tree back out. Everything that is not an
//! element (text, entity references, comments, CDATA) is carried through as
//! the unmodified `quick_xml` event, so text is never rewritten.
//!
//! Input is raw HTML as much as XHTML: attributes are read in HTML mode
//! (`<details open>`), `script`/`style` bodies are raw text, and a bare `&`
//! is plain text.

use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use std::io::Cursor;
use std::str;
use thiserror::Error;

/// Elements that never have children in HTML, even when written `<br>`.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is raw text, never markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Errors raised while reading or writing an HTML fragment.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML parse error at position {position}: {source}")]
    Parse {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("failed to write HTML")]
    Write(#[from] std::io::Error),

    #[error("non UTF-8 markup")]
    Utf8(#[from] std::str::Utf8Error),
}

// ============================================================================
// XML Reader Creation
// ============================================================================

/// Create a configured XML reader from content bytes
#[inline]
pub fn create_xml_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    reader.config_mut().allow_dangling_amp = true;
    reader
}

// ============================================================================
// Tree
// ============================================================================

/// A node of the fragment tree.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Any non-element event, written back verbatim.
    Other(Event<'static>),
}

/// An owned element. Attribute values are kept in their escaped form; an
/// empty value is written back as a bare attribute name.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Written as `<tag/>` when it has no children.
    pub self_closing: bool,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Raw (escaped) attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any previous value in place.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_owned(),
            None => self.attrs.push((key.to_owned(), value.to_owned())),
        }
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Mutable iterator over direct child elements with the given tag.
    pub fn children_named_mut<'a>(
        &'a mut self,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> + 'a {
        self.children.iter_mut().filter_map(move |node| match node {
            Node::Element(elem) if elem.tag == tag => Some(elem),
            _ => None,
        })
    }

    /// Remove and return direct child elements with the given tag, in order.
    pub fn take_children_named(&mut self, tag: &str) -> Vec<Element> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.children.len());
        for node in self.children.drain(..) {
            match node {
                Node::Element(elem) if elem.tag == tag => taken.push(elem),
                other => kept.push(other),
            }
        }
        self.children = kept;
        taken
    }

    fn start_event(&self) -> BytesStart<'static> {
        let mut content = self.tag.clone();
        for (key, value) in &self.attrs {
            content.push(' ');
            content.push_str(key);
            match value.as_str() {
                "" => {}
                v if v.contains('"') => content.push_str(&format!("='{v}'")),
                v => content.push_str(&format!("=\"{v}\"")),
            }
        }
        BytesStart::from_content(content, self.tag.len())
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse an HTML fragment into a synthetic root element holding its nodes.
pub fn parse_fragment(html: &str) -> Result<Element, XmlError> {
    let mut reader = create_xml_reader(html.as_bytes());
    let mut stack = vec![Element::new("")];

    loop {
        let event = reader.read_event().map_err(|source| XmlError::Parse {
            position: reader.error_position(),
            source,
        })?;
        match event {
            Event::Start(start) => {
                let mut elem = element_from_start(&start)?;
                if VOID_ELEMENTS.contains(&elem.tag.as_str()) {
                    push_node(&mut stack, Node::Element(Element { self_closing: true, ..elem }));
                } else if RAW_TEXT_ELEMENTS.contains(&elem.tag.as_str()) {
                    let text = take_raw_text(&mut reader, &elem.tag)?;
                    if !text.is_empty() {
                        let text = BytesText::from_escaped(text);
                        elem.children.push(Node::Other(Event::Text(text)));
                    }
                    stack.push(elem);
                } else {
                    stack.push(elem);
                }
            }
            Event::Empty(start) => {
                let elem = element_from_start(&start)?;
                push_node(&mut stack, Node::Element(Element { self_closing: true, ..elem }));
            }
            Event::End(end) => {
                let name = str::from_utf8(end.name().as_ref())?.to_owned();
                // Stray end tags (void elements, unbalanced raw HTML) are dropped
                if let Some(depth) = stack.iter().rposition(|e| e.tag == name)
                    && depth > 0
                {
                    while stack.len() > depth {
                        close_top(&mut stack);
                    }
                }
            }
            Event::Eof => break,
            other => push_node(&mut stack, Node::Other(other.into_owned())),
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    Ok(stack.pop().unwrap_or_default())
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let tag = str::from_utf8(start.name().as_ref())?.to_owned();
    let mut attrs = Vec::new();
    for attr in start.html_attributes().with_checks(false).flatten() {
        let key = str::from_utf8(attr.key.as_ref())?.to_owned();
        let value = str::from_utf8(attr.value.as_ref())?.to_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        tag,
        attrs,
        children: Vec::new(),
        self_closing: false,
    })
}

/// Consume input up to the closing `</tag`, leaving it for the reader.
fn take_raw_text<'a>(reader: &mut Reader<&'a [u8]>, tag: &str) -> Result<String, XmlError> {
    let rest: &'a [u8] = *reader.get_ref();
    let closing = format!("</{tag}");
    let end = rest
        .windows(closing.len())
        .position(|w| w.eq_ignore_ascii_case(closing.as_bytes()))
        .unwrap_or(rest.len());
    let text = str::from_utf8(&rest[..end])?.to_owned();
    *reader.get_mut() = &rest[end..];
    Ok(text)
}

fn push_node(stack: &mut [Element], node: Node) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn close_top(stack: &mut Vec<Element>) {
    if let Some(elem) = stack.pop() {
        push_node(stack, Node::Element(elem));
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Serialize the children of `root` (the synthetic fragment root).
pub fn write_fragment(root: &Element) -> Result<String, XmlError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    for node in &root.children {
        write_node(&mut writer, node)?;
    }
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_node(writer: &mut Writer<Cursor<Vec<u8>>>, node: &Node) -> Result<(), XmlError> {
    match node {
        Node::Other(event) => writer.write_event(event.borrow())?,
        Node::Element(elem) if elem.self_closing && elem.children.is_empty() => {
            writer.write_event(Event::Empty(elem.start_event()))?;
        }
        Node::Element(elem) => {
            writer.write_event(Event::Start(elem.start_event()))?;
            for child in &elem.children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(elem.tag.as_str())))?;
        }
    }
    Ok(())
}
