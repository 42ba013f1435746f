//! config-merge - directive-driven XML attribute merging
//!
//! This library carries live attribute values from one XML document into
//! the structure of another.
//!
//! # Overview
//!
//! Two documents take part in a merge:
//!
//! - the *value* document holds the current, authoritative data (for
//!   example a deployed `Web.config`);
//! - the *mark* document holds the desired structure, with a
//!   `<?merge ...?>` processing instruction in front of every element whose
//!   attribute values should be kept from the value document.
//!
//! The result is the mark document with those instructions removed and the
//! selected attribute values overwritten.
//!
//! # Directives
//!
//! ```text
//! <?merge appSettings, by="key", attr="value"?>
//! <add key="ConnectionTimeout" value="30" />
//! ```
//!
//! - `by` looks the counterpart up by the value of the named attribute
//!   instead of by position among same-named siblings;
//! - `attr` limits the copy to a comma-separated list of attributes
//!   (default: every attribute of the mark element).
//!
//! # Example
//!
//! ```
//! let value = r#"<config><item id="a" v="live"/></config>"#;
//! let mark = r#"<config><?merge by="id"?><item id="a" v="template"/></config>"#;
//!
//! let merged = config_merge::merge_xml(value, mark).unwrap();
//! assert_eq!(merged, r#"<config><item id="a" v="live" /></config>"#);
//! ```

pub mod error;
pub mod merge;
pub mod node;
pub mod xml;

// Re-export commonly used types
pub use error::{Error, Result};
pub use node::{
    ancestors, new_document_root, new_node, NodeInner, NodeRef, WeakNodeRef, XmlAttribute,
    XmlComment, XmlContent, XmlElement, XmlProcessingInstruction, XmlText,
};
pub use xml::{
    parse_file, parse_str, print_to_string, print_to_string_pretty, Document, XmlDeclaration,
    XmlParser, XmlPrinter, XmlPrinterOptions,
};

// Re-export merge types
pub use merge::{
    apply_directive, copy_attr_values, merge_xml, scan_directives, DirectiveOptions, ElementPath,
    MergeDirective, MergeEntry, MergeLog, MergeOutcome, MergeOutput, PathStep, ScannedDirective,
    Selector, XmlMerger,
};
