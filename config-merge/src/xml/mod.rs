//! XML parsing and output.
//!
//! The parser keeps everything the merge engine needs to see and everything
//! a reader expects to get back: comments, processing instructions, the
//! doctype, CDATA sections and whitespace text all survive a parse/print
//! round trip.

mod parser;
mod printer;

pub use parser::{parse_file, parse_str, XmlParser};
pub use printer::{print_to_string, print_to_string_pretty, XmlPrinter, XmlPrinterOptions};

use crate::node::{descendant_elements, NodeRef};

/// The `<?xml ...?>` declaration of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    /// Declared XML version.
    pub version: String,
    /// Declared encoding, if any.
    pub encoding: Option<String>,
    /// Declared standalone flag, if any.
    pub standalone: Option<String>,
}

impl std::fmt::Display for XmlDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<?xml version=\"{}\"", self.version)?;
        if let Some(encoding) = &self.encoding {
            write!(f, " encoding=\"{}\"", encoding)?;
        }
        if let Some(standalone) = &self.standalone {
            write!(f, " standalone=\"{}\"", standalone)?;
        }
        write!(f, "?>")
    }
}

/// A parsed XML document.
///
/// `root` is a synthetic node whose children are the document's top-level
/// nodes; exactly one of them is an element.
#[derive(Debug)]
pub struct Document {
    root: NodeRef,
    declaration: Option<XmlDeclaration>,
}

impl Document {
    /// Wraps an already built tree.
    pub fn new(root: NodeRef, declaration: Option<XmlDeclaration>) -> Self {
        Document { root, declaration }
    }

    /// Returns the synthetic root holding the top-level nodes.
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Returns the document element.
    pub fn document_element(&self) -> Option<NodeRef> {
        self.root
            .borrow()
            .children()
            .iter()
            .find(|child| child.borrow().is_element())
            .cloned()
    }

    /// Returns the XML declaration, if the document had one.
    pub fn declaration(&self) -> Option<&XmlDeclaration> {
        self.declaration.as_ref()
    }

    /// Returns every element in document order.
    pub fn elements(&self) -> Vec<NodeRef> {
        descendant_elements(&self.root)
    }
}
