//! XML parser that builds node trees.
//!
//! This parser uses quick-xml's streaming API. Unlike a parser that only
//! cares about elements and text, it keeps comments and processing
//! instructions as nodes: merge directives live in processing instructions.

use std::fs;
use std::path::Path;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;

use super::{Document, XmlDeclaration};
use crate::error::{Error, Result};
use crate::node::{
    new_document_root, new_node, NodeInner, NodeRef, XmlAttribute, XmlComment, XmlContent,
    XmlElement, XmlProcessingInstruction, XmlText,
};

/// XML parser that builds node trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlParser;

impl XmlParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        XmlParser
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<Document> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let mut reader = Reader::from_str(xml);
        // Keep whitespace text so untouched parts of the document print back verbatim
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a UTF-8 file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let text = fs::read_to_string(path)?;
        self.parse_str(&text)
    }

    fn parse_reader(&self, reader: &mut Reader<&[u8]>) -> Result<Document> {
        let root = new_document_root();
        let mut node_stack: Vec<NodeRef> = vec![root.clone()];
        let mut declaration = None;
        let mut seen_root = false;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::MalformedXml(format!("{} (at byte {})", e, reader.buffer_position()))
            })?;
            let at_top_level = node_stack.len() == 1;

            match event {
                Event::Start(ref e) => {
                    if at_top_level {
                        check_single_root(&mut seen_root)?;
                    }
                    let node = new_node(XmlContent::Element(self.parse_element(e)?));
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child_to_ref(parent, node.clone());
                    }
                    node_stack.push(node);
                }
                Event::End(_) => {
                    if at_top_level {
                        return Err(Error::MalformedXml(
                            "closing tag without matching opening tag".to_string(),
                        ));
                    }
                    node_stack.pop();
                }
                Event::Empty(ref e) => {
                    if at_top_level {
                        check_single_root(&mut seen_root)?;
                    }
                    let node = new_node(XmlContent::Element(self.parse_element(e)?));
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child_to_ref(parent, node);
                    }
                }
                Event::Text(ref e) => {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|e| Error::MalformedXml(e.to_string()))?;
                    let text = unescape(raw).map_err(|e| Error::MalformedXml(e.to_string()))?;
                    if at_top_level && !text.trim().is_empty() {
                        return Err(Error::MalformedXml(
                            "text content outside the root element".to_string(),
                        ));
                    }
                    if let Some(parent) = node_stack.last() {
                        append_text(parent, &text);
                    }
                }
                Event::GeneralRef(ref e) => {
                    if at_top_level {
                        return Err(Error::MalformedXml(
                            "entity reference outside the root element".to_string(),
                        ));
                    }
                    let name = std::str::from_utf8(e.as_ref())
                        .map_err(|e| Error::MalformedXml(e.to_string()))?;
                    let resolved = resolve_reference(name)?;
                    if let Some(parent) = node_stack.last() {
                        append_text(parent, &resolved);
                    }
                }
                Event::CData(ref e) => {
                    if at_top_level {
                        return Err(Error::MalformedXml(
                            "CDATA section outside the root element".to_string(),
                        ));
                    }
                    let text = String::from_utf8_lossy(e.as_ref());
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child_to_ref(
                            parent,
                            new_node(XmlContent::Text(XmlText::cdata(&text))),
                        );
                    }
                }
                Event::Comment(ref e) => {
                    let comment_text = String::from_utf8_lossy(e.as_ref()).to_string();
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child_to_ref(
                            parent,
                            new_node(XmlContent::Comment(XmlComment::new(&comment_text))),
                        );
                    }
                }
                Event::PI(ref e) => {
                    let target = std::str::from_utf8(e.target())
                        .map_err(|e| Error::MalformedXml(e.to_string()))?;
                    let content = String::from_utf8_lossy(e.content());
                    let pi = XmlProcessingInstruction::new(target, content.trim_start());
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child_to_ref(
                            parent,
                            new_node(XmlContent::ProcessingInstruction(pi)),
                        );
                    }
                }
                Event::Decl(ref e) => {
                    declaration = Some(parse_declaration(e)?);
                }
                Event::DocType(ref e) => {
                    let body = String::from_utf8_lossy(e.as_ref()).trim().to_string();
                    NodeInner::add_child_to_ref(&root, new_node(XmlContent::DocType(body)));
                }
                Event::Eof => {
                    if node_stack.len() > 1 {
                        return Err(Error::MalformedXml(format!(
                            "unexpected end of input: {} unclosed element(s)",
                            node_stack.len() - 1
                        )));
                    }
                    if !seen_root {
                        return Err(Error::MalformedXml("no root element".to_string()));
                    }
                    break;
                }
            }
        }

        Ok(Document::new(root, declaration))
    }

    /// Parses an element's name and attributes.
    fn parse_element(&self, e: &BytesStart) -> Result<XmlElement> {
        let name = std::str::from_utf8(e.name().as_ref())
            .map_err(|e| Error::MalformedXml(e.to_string()))?
            .to_string();

        let mut attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result
                .map_err(|e| Error::MalformedXml(format!("attribute error in <{}>: {}", name, e)))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::MalformedXml(e.to_string()))?
                .to_string();
            let raw = std::str::from_utf8(&attr.value)
                .map_err(|e| Error::MalformedXml(e.to_string()))?;
            let value = unescape(&normalize_attribute_value(raw))
                .map_err(|e| Error::MalformedXml(e.to_string()))?
                .to_string();
            if let Some(c) = value.chars().find(|c| !is_xml_char(*c)) {
                return Err(Error::MalformedXml(format!(
                    "character U+{:04X} not allowed in attribute {} of <{}>",
                    u32::from(c),
                    key,
                    name
                )));
            }
            attributes.push(XmlAttribute::new(key, value));
        }

        Ok(XmlElement::new(name, attributes))
    }
}

/// Rejects a second top-level element.
fn check_single_root(seen_root: &mut bool) -> Result<()> {
    if *seen_root {
        return Err(Error::MalformedXml(
            "more than one root element".to_string(),
        ));
    }
    *seen_root = true;
    Ok(())
}

/// Appends text to the parent, extending its last child if that is plain text.
///
/// Entity references arrive as separate events, so one run of character data
/// can be delivered in several pieces.
fn append_text(parent: &NodeRef, text: &str) {
    if text.is_empty() {
        return;
    }
    {
        let parent_borrowed = parent.borrow();
        if let Some(last) = parent_borrowed.children().last() {
            let mut last_borrowed = last.borrow_mut();
            if let XmlContent::Text(existing) = last_borrowed.content_mut() {
                if !existing.is_cdata() {
                    existing.push_str(text);
                    return;
                }
            }
        }
    }
    NodeInner::add_child_to_ref(parent, new_node(XmlContent::Text(XmlText::new(text))));
}

/// Resolves the name inside `&...;` to its replacement text.
fn resolve_reference(name: &str) -> Result<String> {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => code.parse::<u32>(),
        };
        return parsed
            .ok()
            .and_then(char::from_u32)
            .filter(|c| is_xml_char(*c))
            .map(|c| c.to_string())
            .ok_or_else(|| Error::MalformedXml(format!("invalid character reference &{};", name)));
    }
    let replacement = match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        _ => {
            return Err(Error::MalformedXml(format!(
                "undeclared entity reference &{};",
                name
            )))
        }
    };
    Ok(replacement.to_string())
}

/// Replaces each literal line break or tab in a raw attribute value with a space.
///
/// Line breaks written as character references (`&#10;`) are resolved after
/// this step and therefore survive.
fn normalize_attribute_value(raw: &str) -> String {
    raw.replace("\r\n", " ").replace(['\r', '\n', '\t'], " ")
}

/// Returns true for characters an XML 1.0 document may contain.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Reads version, encoding and standalone out of an `<?xml ...?>` declaration.
fn parse_declaration(decl: &BytesDecl) -> Result<XmlDeclaration> {
    let version = decl
        .version()
        .map_err(|e| Error::MalformedXml(format!("XML declaration: {}", e)))?;
    let encoding = match decl.encoding() {
        Some(Ok(value)) => Some(lossy(&value)),
        Some(Err(e)) => return Err(Error::MalformedXml(format!("XML declaration: {}", e))),
        None => None,
    };
    let standalone = match decl.standalone() {
        Some(Ok(value)) => Some(lossy(&value)),
        Some(Err(e)) => return Err(Error::MalformedXml(format!("XML declaration: {}", e))),
        None => None,
    };

    Ok(XmlDeclaration {
        version: lossy(&version),
        encoding,
        standalone,
    })
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

/// Parses XML from a file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    XmlParser::new().parse_file(path)
}

/// Parses XML from a string.
pub fn parse_str(xml: &str) -> Result<Document> {
    XmlParser::new().parse_str(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_element(doc: &Document) -> NodeRef {
        doc.document_element().expect("document element")
    }

    #[test]
    fn test_parse_simple_xml() {
        let doc = parse_str(r#"<root><child>text</child></root>"#).unwrap();

        // Synthetic root holds exactly the document element
        assert_eq!(doc.root().borrow().child_count(), 1);

        let root_elem = document_element(&doc);
        let root_borrowed = root_elem.borrow();
        assert_eq!(root_borrowed.element().unwrap().qname(), "root");

        let child = root_borrowed.children()[0].clone();
        assert_eq!(child.borrow().element().unwrap().qname(), "child");
    }

    #[test]
    fn test_parse_with_attributes_in_order() {
        let doc = parse_str(r#"<root id="foo" class="bar" z="1"/>"#).unwrap();
        let root_elem = document_element(&doc);
        let borrowed = root_elem.borrow();
        let e = borrowed.element().unwrap();

        assert_eq!(e.attribute_names(), vec!["id", "class", "z"]);
        assert_eq!(e.attribute("class"), Some("bar"));
    }

    #[test]
    fn test_processing_instructions_and_comments_survive() {
        let xml = r#"<root><!-- note --><?merge by="key"?><add key="a"/></root>"#;
        let doc = parse_str(xml).unwrap();
        let root_elem = document_element(&doc);
        let borrowed = root_elem.borrow();

        assert_eq!(borrowed.child_count(), 3);
        assert!(borrowed.children()[0].borrow().content().is_comment());

        let pi_node = borrowed.children()[1].clone();
        let pi_borrowed = pi_node.borrow();
        let pi = pi_borrowed.content().as_processing_instruction().unwrap();
        assert_eq!(pi.target(), "merge");
        assert_eq!(pi.content(), r#"by="key""#);
    }

    #[test]
    fn test_whitespace_text_kept_verbatim() {
        let doc = parse_str("<root>\n  <a/>\n</root>").unwrap();
        let root_elem = document_element(&doc);
        let borrowed = root_elem.borrow();

        assert_eq!(borrowed.child_count(), 3);
        let first = borrowed.children()[0].borrow();
        assert_eq!(first.content().as_text().unwrap().text(), "\n  ");
    }

    #[test]
    fn test_entity_references_are_resolved_into_one_text_node() {
        let doc = parse_str(r#"<root a="x &amp; y">1 &lt; 2 &#65;&#x42;</root>"#).unwrap();
        let root_elem = document_element(&doc);
        let borrowed = root_elem.borrow();

        assert_eq!(borrowed.element().unwrap().attribute("a"), Some("x & y"));
        assert_eq!(borrowed.child_count(), 1);
        let text = borrowed.children()[0].borrow();
        assert_eq!(text.content().as_text().unwrap().text(), "1 < 2 AB");
    }

    #[test]
    fn test_declaration_is_recorded() {
        let doc = parse_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root/>").unwrap();
        let decl = doc.declaration().unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("utf-8"));
        assert_eq!(decl.standalone, None);
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let doc = parse_str("\u{feff}<root/>").unwrap();
        assert!(doc.document_element().is_some());
    }

    #[test]
    fn test_malformed_inputs_are_rejected() {
        let cases = [
            "",
            "not xml at all",
            "<root>",
            "<root></other>",
            "<a/><b/>",
            r#"<root a="1" a="2"/>"#,
            "<root>&nbsp;</root>",
            "<root>&#0;</root>",
            "<root>&#xFFFE;</root>",
            r#"<root a="&#1;"/>"#,
        ];
        for case in cases {
            let err = parse_str(case).unwrap_err();
            assert!(err.is_malformed(), "expected malformed error for {:?}, got {}", case, err);
        }
    }

    #[test]
    fn test_attribute_line_breaks_and_tabs_become_spaces() {
        let doc = parse_str("<root v=\"x\ny\tz\r\nw\" lf=\"a&#10;b\"/>").unwrap();
        let root_elem = document_element(&doc);
        {
            let borrowed = root_elem.borrow();
            let e = borrowed.element().unwrap();
            assert_eq!(e.attribute("v"), Some("x y z w"));
            assert_eq!(e.attribute("lf"), Some("a\nb"));
        }

        assert_eq!(
            crate::xml::print_to_string(&doc).unwrap(),
            r#"<root v="x y z w" lf="a&#10;b" />"#
        );
    }

    #[test]
    fn test_internal_subset_entities_are_not_expanded() {
        let err = parse_str(r#"<!DOCTYPE r [<!ENTITY e "x">]><r>&e;</r>"#).unwrap_err();
        assert!(err.is_malformed());

        let doc = parse_str(r#"<!DOCTYPE r [<!ENTITY e "x">]><r/>"#).unwrap();
        assert!(doc.document_element().is_some());
    }
}
