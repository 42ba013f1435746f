//! XML printer that outputs node trees.
//!
//! By default the printer reproduces the parsed document as written: every
//! retained node in order, whitespace text included. Pretty printing drops
//! whitespace-only text and re-indents instead.

use std::io::Write;

use super::Document;
use crate::node::{NodeRef, XmlContent, XmlElement};

/// Options for XML printing.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlPrinterOptions {
    /// Whether to pretty-print with indentation.
    pub pretty_print: bool,
}

/// XML printer that outputs node trees.
pub struct XmlPrinter<W: Write> {
    writer: W,
    options: XmlPrinterOptions,
    /// Whether anything has been written yet (pretty mode line breaks).
    wrote_line: bool,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a new XML printer.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, XmlPrinterOptions::default())
    }

    /// Creates a new XML printer with the given options.
    pub fn with_options(writer: W, options: XmlPrinterOptions) -> Self {
        XmlPrinter {
            writer,
            options,
            wrote_line: false,
        }
    }

    /// Prints a whole document, including its declaration.
    pub fn print(&mut self, doc: &Document) -> std::io::Result<()> {
        if let Some(decl) = doc.declaration() {
            self.start_line(0)?;
            write!(self.writer, "{}", decl)?;
        }
        self.print_fragment(doc.root())?;
        self.writer.flush()
    }

    /// Prints a node and its subtree (no XML declaration).
    pub fn print_fragment(&mut self, node: &NodeRef) -> std::io::Result<()> {
        if self.options.pretty_print {
            self.print_pretty(node, 0)
        } else {
            self.print_verbatim(node)
        }
    }

    fn print_verbatim(&mut self, node: &NodeRef) -> std::io::Result<()> {
        let borrowed = node.borrow();
        match borrowed.content() {
            XmlContent::Element(_) if borrowed.is_document_root() => {
                for child in borrowed.children() {
                    self.print_verbatim(child)?;
                }
            }
            XmlContent::Element(element) => {
                write!(self.writer, "{}", start_tag(element))?;
                if borrowed.child_count() == 0 {
                    write!(self.writer, " />")?;
                } else {
                    write!(self.writer, ">")?;
                    for child in borrowed.children() {
                        self.print_verbatim(child)?;
                    }
                    write!(self.writer, "</{}>", element.qname())?;
                }
            }
            other => write!(self.writer, "{}", leaf_markup(other))?,
        }
        Ok(())
    }

    fn print_pretty(&mut self, node: &NodeRef, indent: usize) -> std::io::Result<()> {
        let borrowed = node.borrow();
        let significant: Vec<NodeRef> = borrowed
            .children()
            .iter()
            .filter(|child| !is_whitespace_text(child))
            .cloned()
            .collect();

        match borrowed.content() {
            XmlContent::Element(_) if borrowed.is_document_root() => {
                for child in &significant {
                    self.print_pretty(child, indent)?;
                }
            }
            XmlContent::Element(element) => {
                self.start_line(indent)?;
                write!(self.writer, "{}", start_tag(element))?;
                if significant.is_empty() {
                    write!(self.writer, " />")?;
                } else if significant.iter().all(|c| c.borrow().content().is_text()) {
                    // Text-only content stays on the element's line
                    write!(self.writer, ">")?;
                    for child in &significant {
                        write!(self.writer, "{}", leaf_markup(child.borrow().content()))?;
                    }
                    write!(self.writer, "</{}>", element.qname())?;
                } else {
                    write!(self.writer, ">")?;
                    for child in &significant {
                        self.print_pretty(child, indent + 1)?;
                    }
                    self.start_line(indent)?;
                    write!(self.writer, "</{}>", element.qname())?;
                }
            }
            other => {
                self.start_line(indent)?;
                write!(self.writer, "{}", leaf_markup(other))?;
            }
        }
        Ok(())
    }

    /// Starts a new output line in pretty mode; a no-op in verbatim mode.
    fn start_line(&mut self, indent: usize) -> std::io::Result<()> {
        if !self.options.pretty_print {
            return Ok(());
        }
        if self.wrote_line {
            writeln!(self.writer)?;
        }
        self.wrote_line = true;
        write!(self.writer, "{}", Self::indent_str(indent))
    }

    fn indent_str(level: usize) -> String {
        "  ".repeat(level)
    }
}

fn is_whitespace_text(node: &NodeRef) -> bool {
    node.borrow()
        .content()
        .as_text()
        .is_some_and(|t| t.is_whitespace())
}

/// Builds `<name attr="value" ...` without the closing bracket.
fn start_tag(element: &XmlElement) -> String {
    let mut tag = String::new();
    tag.push('<');
    tag.push_str(element.qname());
    for attr in element.attributes() {
        tag.push(' ');
        tag.push_str(&attr.name);
        tag.push_str("=\"");
        tag.push_str(&to_entities(&attr.value));
        tag.push('"');
    }
    tag
}

/// Markup for a node that has no children of its own.
fn leaf_markup(content: &XmlContent) -> String {
    match content {
        XmlContent::Text(text) if text.is_cdata() => format!("<![CDATA[{}]]>", text.text()),
        XmlContent::Text(text) => escape_text(text.text()),
        XmlContent::Comment(comment) => comment.to_string(),
        XmlContent::ProcessingInstruction(pi) => pi.to_string(),
        XmlContent::DocType(body) => format!("<!DOCTYPE {}>", body),
        XmlContent::Element(element) => format!("{} />", start_tag(element)),
    }
}

/// Converts special characters in an attribute value to XML entities.
fn to_entities(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\'' => result.push_str("&apos;"),
            '"' => result.push_str("&quot;"),
            '\n' => result.push_str("&#10;"),
            '\r' => result.push_str("&#13;"),
            '\t' => result.push_str("&#9;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escapes character data.
fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Prints a document to a string, verbatim.
pub fn print_to_string(doc: &Document) -> std::io::Result<String> {
    let mut output = Vec::new();
    {
        let mut printer = XmlPrinter::new(&mut output);
        printer.print(doc)?;
    }
    Ok(String::from_utf8_lossy(&output).to_string())
}

/// Prints a document to a string with pretty printing.
pub fn print_to_string_pretty(doc: &Document) -> std::io::Result<String> {
    let mut output = Vec::new();
    {
        let options = XmlPrinterOptions { pretty_print: true };
        let mut printer = XmlPrinter::with_options(&mut output, options);
        printer.print(doc)?;
    }
    Ok(String::from_utf8_lossy(&output).to_string())
}
