//! The read-only XML tree the converter walks, and the `quick-xml` adapter
//! that builds it from text.
//!
//! Names are kept exactly as written, prefix included (`ns:item`), and
//! namespace declarations stay ordinary attributes. Comments, processing
//! instructions, the XML declaration and doctype are dropped while parsing.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use crate::error::{ConvertError, Result};

/// A parsed document. `root` is `None` when the input held no element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: Option<XmlElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    /// In document order; names are unique within an element.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child elements only, in document order.
    pub fn child_elements(&self) -> impl DoubleEndedIterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }
}

impl From<XmlElement> for XmlDocument {
    fn from(root: XmlElement) -> Self {
        XmlDocument { root: Some(root) }
    }
}

/// Parses `xml` into an [`XmlDocument`], refusing to nest deeper than `max_depth`.
///
/// The tree is built with an explicit stack, so hostile nesting is stopped
/// here before anything recursive touches it.
pub fn parse_document(xml: &str, max_depth: usize) -> Result<XmlDocument> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| xml_error(reader.buffer_position(), &e.to_string()))?;

        match event {
            Event::Start(e) => {
                let element = start_element(&reader, &e, position)?;
                check_placement(&open, &root, &element, max_depth, position)?;
                open.push(element);
            }
            Event::Empty(e) => {
                let element = start_element(&reader, &e, position)?;
                check_placement(&open, &root, &element, max_depth, position)?;
                attach(&mut open, &mut root, element);
            }
            Event::End(_) => match open.pop() {
                Some(element) => attach(&mut open, &mut root, element),
                None => return Err(xml_error(position, "closing tag without an open element")),
            },
            Event::Text(e) => {
                let text = e.unescape().map_err(|err| xml_error(position, &err.to_string()))?;
                push_text(&mut open, &text, position)?;
            }
            Event::CData(e) => {
                let bytes = e.into_inner();
                let text = reader
                    .decoder()
                    .decode(&bytes)
                    .map_err(|err| xml_error(position, &err.to_string()))?;
                push_text(&mut open, &text, position)?;
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(xml_error(
            reader.buffer_position(),
            &format!("unexpected end of document, <{}> is not closed", unclosed.name),
        ));
    }

    trace!(has_root = root.is_some(), "parsed XML document");
    Ok(XmlDocument { root })
}

/// Reads the name and attributes of a start tag found at `position`.
fn start_element(reader: &Reader<&[u8]>, e: &BytesStart<'_>, position: usize) -> Result<XmlElement> {
    let decoder = reader.decoder();
    let qname = e.name();
    let name = decoder.decode(qname.as_ref()).map_err(|err| xml_error(position, &err.to_string()))?;
    let mut element = XmlElement::new(name.into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(position, &err.to_string()))?;
        let key = decoder.decode(attr.key.as_ref()).map_err(|err| xml_error(position, &err.to_string()))?;
        let value = attr.unescape_value().map_err(|err| xml_error(position, &err.to_string()))?;
        element.attributes.push((key.into_owned(), value.into_owned()));
    }
    Ok(element)
}

fn check_placement(
    open: &[XmlElement],
    root: &Option<XmlElement>,
    element: &XmlElement,
    max_depth: usize,
    position: usize,
) -> Result<()> {
    if open.is_empty() && root.is_some() {
        return Err(xml_error(
            position,
            &format!("second root element <{}>", element.name),
        ));
    }
    if open.len() >= max_depth {
        let mut path: String = open.iter().map(|el| format!("/{}", el.name)).collect();
        path.push('/');
        path.push_str(&element.name);
        return Err(ConvertError::DepthExceeded {
            max: max_depth,
            path,
        });
    }
    Ok(())
}

fn attach(open: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match open.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => *root = Some(element),
    }
}

fn push_text(open: &mut [XmlElement], text: &str, position: usize) -> Result<()> {
    match open.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Text(text.to_owned()));
            Ok(())
        }
        // whitespace around the root is insignificant
        None if text.trim().is_empty() => Ok(()),
        None => Err(xml_error(position, "text outside the root element")),
    }
}

fn xml_error(position: usize, message: &str) -> ConvertError {
    ConvertError::Xml {
        position,
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(xml: &str) -> Result<XmlDocument> {
        parse_document(xml, 64)
    }

    #[test]
    fn test_builds_tree_in_document_order() {
        let doc = parse(r#"<?xml version="1.0"?><a z="1" b="2">hi<b/><!-- note --><c>x</c></a>"#).unwrap();
        let expected = XmlElement::new("a")
            .with_attribute("z", "1")
            .with_attribute("b", "2")
            .with_text("hi")
            .with_child(XmlElement::new("b"))
            .with_child(XmlElement::new("c").with_text("x"));
        assert_eq!(doc, XmlDocument::from(expected));
    }

    #[test]
    fn test_entities_and_cdata() {
        let doc = parse(r#"<a t="&lt;x&gt;">1 &amp; 2<![CDATA[ <raw> ]]></a>"#).unwrap();
        let root = doc.root.unwrap();
        assert_eq!(root.attributes, vec![("t".to_owned(), "<x>".to_owned())]);
        assert_eq!(
            root.children,
            vec![
                XmlNode::Text("1 & 2".to_owned()),
                XmlNode::Text(" <raw> ".to_owned())
            ]
        );
    }

    #[test]
    fn test_qualified_names_kept() {
        let doc = parse(r#"<ns:a xmlns:ns="urn:x"><ns:b/></ns:a>"#).unwrap();
        let root = doc.root.unwrap();
        assert_eq!(root.name(), "ns:a");
        assert_eq!(root.attributes[0].0, "xmlns:ns");
        assert_eq!(root.child_elements().next().unwrap().name(), "ns:b");
    }

    #[test]
    fn test_no_root() {
        assert_eq!(parse("").unwrap().root, None);
        assert_eq!(parse("<?xml version=\"1.0\"?>\n<!-- nothing -->\n").unwrap().root, None);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(parse("<a><b></a>"), Err(ConvertError::Xml { .. })));
        assert!(matches!(parse("<a>"), Err(ConvertError::Xml { .. })));
        assert!(matches!(parse("<a/><b/>"), Err(ConvertError::Xml { .. })));
        assert!(matches!(parse("text<a/>"), Err(ConvertError::Xml { .. })));
        assert!(matches!(parse(r#"<a x="1" x="2"/>"#), Err(ConvertError::Xml { .. })));
    }

    #[test]
    fn test_error_positions_point_at_the_bad_node() {
        match parse("<a>&bogus;</a>") {
            Err(ConvertError::Xml { position, .. }) => assert_eq!(position, 3),
            other => panic!("expected an XML error, got {other:?}"),
        }
        match parse(r#"<r><a x="1" x="2"/></r>"#) {
            Err(ConvertError::Xml { position, .. }) => assert_eq!(position, 3),
            other => panic!("expected an XML error, got {other:?}"),
        }
    }

    #[test]
    fn test_depth_limit() {
        let xml = "<a><b><c/></b></a>";
        assert!(parse_document(xml, 3).is_ok());
        assert_eq!(
            parse_document(xml, 2),
            Err(ConvertError::DepthExceeded {
                max: 2,
                path: "/a/b/c".to_owned()
            })
        );
    }
}
