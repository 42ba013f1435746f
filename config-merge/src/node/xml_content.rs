//! XML content types for tree nodes.
//!
//! This module provides `XmlContent`, which represents the content of an XML node:
//! an element (tag with attributes), text, a comment, a processing instruction,
//! or a document type declaration.

/// Represents the content of an XML node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    /// An XML element with a qualified name and attributes.
    Element(XmlElement),
    /// XML text content (character data or a CDATA section).
    Text(XmlText),
    /// XML comment.
    Comment(XmlComment),
    /// XML processing instruction.
    ProcessingInstruction(XmlProcessingInstruction),
    /// Raw `<!DOCTYPE ...>` body, kept so it can be printed back unchanged.
    DocType(String),
}

impl XmlContent {
    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, XmlContent::Element(_))
    }

    /// Returns true if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, XmlContent::Text(_))
    }

    /// Returns true if this is a comment node.
    pub fn is_comment(&self) -> bool {
        matches!(self, XmlContent::Comment(_))
    }

    /// Returns true if this is a processing instruction node.
    pub fn is_processing_instruction(&self) -> bool {
        matches!(self, XmlContent::ProcessingInstruction(_))
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a mutable reference to the element, if this is an element node.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a reference to the text, if this is a text node.
    pub fn as_text(&self) -> Option<&XmlText> {
        match self {
            XmlContent::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a reference to the PI, if this is a processing instruction node.
    pub fn as_processing_instruction(&self) -> Option<&XmlProcessingInstruction> {
        match self {
            XmlContent::ProcessingInstruction(pi) => Some(pi),
            _ => None,
        }
    }
}

/// A single attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Qualified attribute name, as written in the document.
    pub name: String,
    /// Unescaped attribute value.
    pub value: String,
}

impl XmlAttribute {
    /// Creates a new attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        XmlAttribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An XML element with a qualified name and attributes.
///
/// Attributes keep their document order so a merged document prints back
/// the way its author wrote it. Names are unique within an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// The qualified name of the element (e.g., "add", "ns:element").
    name: String,
    /// Attributes in document order.
    attributes: Vec<XmlAttribute>,
}

impl XmlElement {
    /// Creates a new XML element with the given name and attributes.
    ///
    /// Later duplicates of an attribute name replace the earlier value in place.
    pub fn new(name: impl Into<String>, attributes: Vec<XmlAttribute>) -> Self {
        let mut element = XmlElement {
            name: name.into(),
            attributes: Vec::with_capacity(attributes.len()),
        };
        for attr in attributes {
            match element.attributes.iter_mut().find(|a| a.name == attr.name) {
                Some(existing) => existing.value = attr.value,
                None => element.attributes.push(attr),
            }
        }
        element
    }

    /// Returns the qualified name of the element.
    pub fn qname(&self) -> &str {
        &self.name
    }

    /// Returns the local part of the name (everything after the last `:`).
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Returns the attributes in document order.
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Returns true if the element carries at least one attribute.
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Returns the value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns the attribute names in document order.
    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(|a| a.name.clone()).collect()
    }

    /// Overwrites the value of an attribute that is already present.
    ///
    /// Returns false, leaving the element untouched, when the attribute does
    /// not exist. New attributes are never created.
    pub fn set_existing_attribute(&mut self, name: &str, value: &str) -> bool {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => {
                attr.value = value.to_string();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Display for XmlElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {{", self.name)?;
        for attr in &self.attributes {
            write!(f, " {}={}", attr.name, attr.value)?;
        }
        write!(f, " }}")
    }
}

/// Returns the local part of a qualified name.
pub fn local_part(qname: &str) -> &str {
    match qname.rfind(':') {
        Some(pos) => &qname[pos + 1..],
        None => qname,
    }
}

/// XML text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlText {
    /// The unescaped text.
    text: String,
    /// Whether the text came from a CDATA section.
    cdata: bool,
}

impl XmlText {
    /// Creates a new character-data text node.
    pub fn new(text: &str) -> Self {
        XmlText {
            text: text.to_string(),
            cdata: false,
        }
    }

    /// Creates a new text node from a CDATA section.
    pub fn cdata(text: &str) -> Self {
        XmlText {
            text: text.to_string(),
            cdata: true,
        }
    }

    /// Returns the text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Appends more text to this node.
    pub fn push_str(&mut self, more: &str) {
        self.text.push_str(more);
    }

    /// Returns true if this text came from a CDATA section.
    pub fn is_cdata(&self) -> bool {
        self.cdata
    }

    /// Returns true if the text is empty or only whitespace.
    ///
    /// CDATA sections are always significant.
    pub fn is_whitespace(&self) -> bool {
        !self.cdata && self.text.chars().all(char::is_whitespace)
    }
}

impl std::fmt::Display for XmlText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// XML comment content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlComment {
    /// The comment text (without the <!-- and --> markers).
    text: String,
}

impl XmlComment {
    /// Creates a new comment node from a string.
    pub fn new(text: &str) -> Self {
        XmlComment {
            text: text.to_string(),
        }
    }

    /// Returns the comment text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for XmlComment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<!--{}-->", self.text)
    }
}

/// XML processing instruction content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlProcessingInstruction {
    /// The target of the PI (e.g., "merge", "xml-stylesheet").
    target: String,
    /// The data of the PI (everything after the target, leading whitespace removed).
    content: String,
}

impl XmlProcessingInstruction {
    /// Creates a new PI from target and content strings.
    pub fn new(target: &str, content: &str) -> Self {
        XmlProcessingInstruction {
            target: target.to_string(),
            content: content.to_string(),
        }
    }

    /// Returns the PI target.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the PI content.
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for XmlProcessingInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.content.is_empty() {
            write!(f, "<?{}?>", self.target)
        } else {
            write!(f, "<?{} {}?>", self.target, self.content)
        }
    }
}
