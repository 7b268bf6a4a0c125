//! A small owned element tree built from quick-xml events.
//!
//! Nodes keep attributes and children in document order. Text content is trimmed
//! and whitespace-only text is dropped, which is all the molecular convention needs.

use super::error::{CmlError, CmlResult};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    pub text: String,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute insertion, replacing an existing value.
    pub fn with_attribute(mut self, name: &str, value: impl ToString) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: impl ToString) {
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn count_children(&self, name: &str) -> usize {
        self.children_named(name).count()
    }

    pub fn first_child<'a>(&'a self, name: &str) -> Option<&'a Node> {
        self.children.iter().find(|child| child.name == name)
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> CmlResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_empty() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(CmlError::write);
        }

        writer
            .write_event(Event::Start(start))
            .map_err(CmlError::write)?;
        if !self.text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(&self.text)))
                .map_err(CmlError::write)?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(CmlError::write)
    }
}

/// The top level of a parsed document. Well-formed XML has exactly one root,
/// but the parser keeps every top-level element so callers can reject extras.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub roots: Vec<Node>,
}

impl Document {
    pub fn new(root: Node) -> Self {
        Self { roots: vec![root] }
    }

    pub fn parse_str(xml: &str) -> CmlResult<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Read the whole stream into a tree.
    pub fn parse<R: BufRead>(source: R) -> CmlResult<Self> {
        let mut reader = Reader::from_reader(source);
        let mut buf = Vec::new();
        let mut stack: Vec<Node> = Vec::new();
        let mut roots = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                CmlError::malformed(format!("{e} (at byte {})", reader.buffer_position()))
            })?;
            match event {
                Event::Start(e) => stack.push(node_from_start(&e)?),
                Event::Empty(e) => {
                    let node = node_from_start(&e)?;
                    attach(&mut stack, &mut roots, node);
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| CmlError::malformed("unexpected closing tag"))?;
                    attach(&mut stack, &mut roots, node);
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(CmlError::malformed)?;
                    append_text(&mut stack, &text)?;
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    append_text(&mut stack, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(CmlError::malformed(format!(
                "element <{}> is never closed",
                open.name
            )));
        }
        if roots.is_empty() {
            return Err(CmlError::malformed("document has no root element"));
        }
        Ok(Self { roots })
    }

    /// Serialise with an XML declaration and two-space indentation.
    pub fn write<W: Write>(&self, sink: W) -> CmlResult<()> {
        let mut writer = Writer::new_with_indent(sink, b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(CmlError::write)?;
        for root in &self.roots {
            root.write_to(&mut writer)?;
        }
        writer
            .get_mut()
            .write_all(b"\n")
            .map_err(CmlError::write)
    }

    pub fn to_xml_string(&self) -> CmlResult<String> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        String::from_utf8(out).map_err(CmlError::write)
    }
}

fn node_from_start(start: &BytesStart) -> CmlResult<Node> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut node = Node::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(CmlError::malformed)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(CmlError::malformed)?;
        node.attributes.push((key, value.into_owned()));
    }
    Ok(node)
}

fn attach(stack: &mut [Node], roots: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn append_text(stack: &mut [Node], text: &str) -> CmlResult<()> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(node) => {
            node.text.push_str(text);
            Ok(())
        }
        None => Err(CmlError::malformed(format!(
            "text \"{text}\" outside of the root element"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cml::ErrorKind;

    #[test]
    fn test_parse_nested_tree() {
        let doc = Document::parse_str(
            r#"<?xml version="1.0"?>
            <cml><molecule id="m1"><name> water &amp; ice </name>
            <atomArray><atom id="a1" elementType="O"/><atom id="a2"/></atomArray>
            </molecule></cml>"#,
        )
        .expect("well-formed");
        assert_eq!(doc.roots.len(), 1);
        let cml = &doc.roots[0];
        assert_eq!(cml.name, "cml");
        let molecule = cml.first_child("molecule").expect("molecule child");
        assert_eq!(molecule.attribute("id"), Some("m1"));
        assert_eq!(molecule.first_child("name").map(|n| n.text.as_str()), Some("water & ice"));
        let atoms: Vec<_> = molecule
            .first_child("atomArray")
            .expect("atomArray")
            .children_named("atom")
            .map(|atom| atom.attribute("id"))
            .collect();
        assert_eq!(atoms, vec![Some("a1"), Some("a2")]);
    }

    #[test]
    fn test_first_child_outlives_name() {
        let mut molecule = Node::new("molecule");
        molecule.push_child(Node::new("name").with_text("ethanol"));
        let found = {
            let name = String::from("name");
            molecule.first_child(&name)
        };
        assert_eq!(found.map(|n| n.text.as_str()), Some("ethanol"));
    }

    #[test]
    fn test_multiple_roots_are_kept() {
        let doc = Document::parse_str("<cml/><cml/>").expect("lenient about roots");
        assert_eq!(doc.roots.len(), 2);
    }

    #[test]
    fn test_malformed_markup() {
        for xml in ["<cml><molecule></cml>", "<cml>", "", "<cml a=\"1/>"] {
            let err = Document::parse_str(xml).expect_err(xml);
            assert_eq!(err.kind, ErrorKind::MalformedDocument, "{xml}");
        }
    }

    #[test]
    fn test_write_and_reparse() {
        let mut root = Node::new("cml").with_attribute("xmlns", "http://www.xml-cml.org/schema");
        let mut molecule = Node::new("molecule").with_attribute("id", "m0");
        molecule.push_child(Node::new("name").with_text("a < b"));
        molecule.push_child(Node::new("atomArray"));
        root.push_child(molecule);

        let xml = Document::new(root.clone()).to_xml_string().expect("writable");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("a &lt; b"));
        let reparsed = Document::parse_str(&xml).expect("round trip");
        assert_eq!(reparsed.roots, vec![root]);
    }

    #[test]
    fn test_set_attribute_replaces() {
        let node = Node::new("atom")
            .with_attribute("id", "a0")
            .with_attribute("id", "a1");
        assert_eq!(node.attributes, vec![("id".to_string(), "a1".to_string())]);
    }
}
