//! Minimal mutable XML tree used to adopt and rewrite DIDL-Lite documents.
//!
//! The tree keeps qualified names and attributes exactly as read (namespace
//! declarations are ordinary attributes here) and preserves whitespace text,
//! so that a document written by [`Document::to_xml_string`] reads back into
//! an identical tree.

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{DidlError, Result};

pub const DIDL_LITE: &str = "DIDL-Lite";
pub const ITEM: &str = "item";

pub const NS_DIDL_LITE: &str = "urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/";
pub const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
pub const NS_UPNP: &str = "urn:schemas-upnp-org:metadata-1-0/upnp/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    /// Content of an XML declaration, between `<?` and `?>`.
    Decl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces the attribute value in place, or appends the attribute.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, current)) => *current = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// First direct child element with this qualified name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    /// First direct child element whose local part (after the prefix)
    /// matches, for documents that drop or rename namespace prefixes.
    pub fn child_by_local_name(&self, name: &str) -> Option<&Element> {
        let wanted = local_name(name);
        self.elements()
            .find(|element| local_name(&element.name) == wanted)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn push_child(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Concatenated text of the direct text and CDATA children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) | Node::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Top-level content of a parsed document: the XML declaration, the root
/// element, and the comments and whitespace around it. Processing
/// instructions and doctypes are not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    /// Builds the canonical empty DIDL-Lite document with a single `item`.
    pub fn didl_skeleton() -> Self {
        let mut root = Element::new(DIDL_LITE);
        root.set_attribute("xmlns", NS_DIDL_LITE);
        root.set_attribute("xmlns:dc", NS_DC);
        root.set_attribute("xmlns:upnp", NS_UPNP);

        let mut item = Element::new(ITEM);
        item.set_attribute("id", "");
        item.set_attribute("parentID", "0");
        item.set_attribute("restricted", "false");
        root.push_child(item);

        Self {
            nodes: vec![Node::Element(root)],
        }
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(element_from_start(&start)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut nodes, Node::Element(element));
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or(DidlError::Unbalanced)?;
                    attach(&mut stack, &mut nodes, Node::Element(element));
                }
                Event::Text(text) => {
                    let raw = std::str::from_utf8(&text)?;
                    let text = unescape(raw).map_err(DidlError::malformed)?;
                    push_text(&mut stack, &mut nodes, &text)?;
                }
                Event::GeneralRef(reference) => {
                    let resolved = match reference
                        .resolve_char_ref()
                        .map_err(DidlError::malformed)?
                    {
                        Some(ch) => ch.to_string(),
                        None => {
                            let name = std::str::from_utf8(&reference)?;
                            resolve_predefined_entity(name)
                                .ok_or_else(|| DidlError::UnknownEntity(name.to_string()))?
                                .to_string()
                        }
                    };
                    push_text(&mut stack, &mut nodes, &resolved)?;
                }
                Event::CData(data) => {
                    let data = std::str::from_utf8(&data)?.to_string();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::CData(data)),
                        None => return Err(DidlError::malformed("CDATA outside root element")),
                    }
                }
                Event::Comment(comment) => {
                    let comment = std::str::from_utf8(&comment)?.to_string();
                    attach(&mut stack, &mut nodes, Node::Comment(comment));
                }
                Event::Decl(decl) => {
                    let decl = std::str::from_utf8(&decl)?.to_string();
                    nodes.push(Node::Decl(decl));
                }
                Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(DidlError::Unbalanced);
        }

        Ok(Self { nodes })
    }

    /// First top-level element named `name`.
    pub fn root(&self, name: &str) -> Option<&Element> {
        self.nodes.iter().find_map(|node| match node {
            Node::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    pub fn root_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.nodes.iter_mut().find_map(|node| match node {
            Node::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    /// The `DIDL-Lite > item` element, if the document has that shape.
    pub fn didl_item(&self) -> Option<&Element> {
        self.root(DIDL_LITE)?.child(ITEM)
    }

    pub fn didl_item_mut(&mut self) -> Option<&mut Element> {
        self.root_mut(DIDL_LITE)?.child_mut(ITEM)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node)?;
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut element = Element::new(name);

    for attribute in start.attributes() {
        let attribute = attribute.map_err(DidlError::malformed)?;
        let key = std::str::from_utf8(attribute.key.as_ref())?.to_string();
        let raw = std::str::from_utf8(&attribute.value)?;
        let value = unescape(raw).map_err(DidlError::malformed)?.into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn attach(stack: &mut [Element], nodes: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => nodes.push(node),
    }
}

/// Appends text to the open element, merging with a preceding text node
/// (entity references split text into several events). Only whitespace is
/// allowed between top-level nodes.
fn push_text(stack: &mut [Element], nodes: &mut Vec<Node>, text: &str) -> Result<()> {
    let siblings = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None if text.trim().is_empty() => nodes,
        None => return Err(DidlError::malformed("text outside root element")),
    };

    match siblings.last_mut() {
        Some(Node::Text(previous)) => previous.push_str(text),
        _ => siblings.push(Node::Text(text.to_string())),
    }
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    match node {
        Node::Element(element) => {
            let mut start = BytesStart::new(element.name.as_str());
            for (key, value) in &element.attributes {
                start.push_attribute((key.as_str(), value.as_str()));
            }

            if element.children.is_empty() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for child in &element.children {
                    write_node(writer, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
            }
        }
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        Node::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str())))?,
        Node::Comment(comment) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?
        }
        Node::Decl(decl) => {
            let start = BytesStart::from_content(decl.as_str(), 3);
            writer.write_event(Event::Decl(BytesDecl::from_start(start)))?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_shape() {
        let document = Document::didl_skeleton();
        let root = document.root(DIDL_LITE).unwrap();
        assert_eq!(root.attribute("xmlns"), Some(NS_DIDL_LITE));
        assert_eq!(root.attribute("xmlns:dc"), Some(NS_DC));
        assert_eq!(root.attribute("xmlns:upnp"), Some(NS_UPNP));

        let item = document.didl_item().unwrap();
        assert_eq!(item.attribute("id"), Some(""));
        assert_eq!(item.attribute("parentID"), Some("0"));
        assert_eq!(item.attribute("restricted"), Some("false"));
        assert!(item.children.is_empty());
    }

    #[test]
    fn test_parse_resolves_entities_into_one_text_node() {
        let document =
            Document::parse("<DIDL-Lite><item><dc:title>Rock &amp; Roll &#33;</dc:title></item></DIDL-Lite>")
                .unwrap();
        let title = document.didl_item().unwrap().child("dc:title").unwrap();
        assert_eq!(title.children, vec![Node::Text("Rock & Roll !".to_string())]);
    }

    #[test]
    fn test_parse_rejects_broken_input() {
        assert!(Document::parse("<DIDL-Lite><item></DIDL-Lite>").is_err());
        assert!(Document::parse("<DIDL-Lite><item>").is_err());
        assert!(Document::parse("just some words").is_err());
        assert!(Document::parse("<a>&bogus;</a>").is_err());
        assert!(Document::parse(r#"<a x="1" x="2"/>"#).is_err());
    }

    #[test]
    fn test_parse_empty_input_has_no_root() {
        let document = Document::parse("").unwrap();
        assert!(document.nodes.is_empty());
        assert!(document.didl_item().is_none());
    }

    #[test]
    fn test_write_then_read_keeps_tree() {
        let xml = "<DIDL-Lite xmlns=\"urn:x\">\n  <item id=\"a&amp;b\">\n    <dc:title>&lt;Intro&gt;</dc:title>\n    <!-- note --><upnp:class><![CDATA[object.item]]></upnp:class>\n  </item>\n</DIDL-Lite>";
        let document = Document::parse(xml).unwrap();
        let written = document.to_xml_string().unwrap();
        let reread = Document::parse(&written).unwrap();
        assert_eq!(document, reread);
        assert_eq!(written, reread.to_xml_string().unwrap());
    }

    #[test]
    fn test_root_is_first_element_with_that_name() {
        let document = Document::parse("<meta/><DIDL-Lite><item id=\"k\"/></DIDL-Lite>").unwrap();
        assert_eq!(document.didl_item().unwrap().attribute("id"), Some("k"));

        let document = Document::parse("<wrapper><DIDL-Lite><item/></DIDL-Lite></wrapper>").unwrap();
        assert!(document.didl_item().is_none());
    }

    #[test]
    fn test_declaration_and_top_level_whitespace_are_kept() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<DIDL-Lite><item id=\"1\"/></DIDL-Lite>\n";
        let document = Document::parse(xml).unwrap();
        assert!(matches!(&document.nodes[0], Node::Decl(decl) if decl.starts_with("xml ")));
        assert_eq!(document.to_xml_string().unwrap(), xml);
    }

    #[test]
    fn test_local_name_lookup() {
        let document = Document::parse("<DIDL-Lite><item><title>T</title></item></DIDL-Lite>").unwrap();
        let item = document.didl_item().unwrap();
        assert!(item.child("dc:title").is_none());
        assert_eq!(item.child_by_local_name("dc:title").unwrap().text(), "T");
    }
}
