//! Directive-driven attribute merge.
//!
//! This module merges a *value* document (live configuration) into a *mark*
//! document (the desired structure, annotated with `<?merge ...?>`
//! instructions). The result keeps the mark document's structure, with the
//! attribute values of every directive-bearing element taken from its
//! counterpart in the value document.
//!
//! # Algorithm Overview
//!
//! 1. Parse both documents
//! 2. Scan the mark document for directives, detaching each instruction
//! 3. For each directive, build a positional or keyed path to the element
//!    and evaluate it against the value document
//! 4. Copy the requested attribute values from the counterpart, if any
//! 5. Print the mark document

mod copier;
mod directive;
mod merge_log;
mod path;
mod scanner;

pub use copier::copy_attr_values;
pub use directive::{DirectiveOptions, MergeDirective, ATTR_KEY, BY_KEY};
pub use merge_log::{MergeEntry, MergeLog, MergeOutcome};
pub use path::{ElementPath, PathStep, Selector};
pub use scanner::{scan_directives, ScannedDirective, MERGE_TARGET};

use tracing::{debug, warn};

use crate::error::Result;
use crate::xml::{Document, XmlParser, XmlPrinter, XmlPrinterOptions};

/// The printed result of a merge together with its log.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// The merged document as text.
    pub xml: String,
    /// What happened to each directive.
    pub log: MergeLog,
}

/// Merges value documents into mark documents.
#[derive(Debug, Clone, Default)]
pub struct XmlMerger {
    options: XmlPrinterOptions,
}

impl XmlMerger {
    /// Creates a merger that prints its result verbatim.
    pub fn new() -> Self {
        XmlMerger::default()
    }

    /// Creates a merger with the given output options.
    pub fn with_options(options: XmlPrinterOptions) -> Self {
        XmlMerger { options }
    }

    /// Sets whether the result is pretty-printed.
    pub fn pretty_print(mut self, pretty: bool) -> Self {
        self.options.pretty_print = pretty;
        self
    }

    /// Parses both documents, merges them and prints the result.
    ///
    /// Fails with [`crate::Error::MalformedXml`] if either input is not
    /// well-formed; nothing is produced in that case.
    pub fn merge_str(&self, value_xml: &str, mark_xml: &str) -> Result<MergeOutput> {
        let parser = XmlParser::new();
        let value = parser.parse_str(value_xml)?;
        let mark = parser.parse_str(mark_xml)?;

        let (merged, log) = self.merge_documents(&value, mark)?;

        let mut output = Vec::new();
        XmlPrinter::with_options(&mut output, self.options).print(&merged)?;
        Ok(MergeOutput {
            xml: String::from_utf8_lossy(&output).to_string(),
            log,
        })
    }

    /// Applies every directive of `mark` against `value` and returns the
    /// mutated mark document.
    ///
    /// `value` is only read. Directives are independent of each other: one
    /// that finds no counterpart does not affect the rest.
    pub fn merge_documents(&self, value: &Document, mark: Document) -> Result<(Document, MergeLog)> {
        let directives = scan_directives(&mark);
        debug!(count = directives.len(), "merge directives found");

        let log = directives
            .iter()
            .try_fold(MergeLog::new(), |mut log, scanned| {
                log.record(apply_directive(value, scanned)?);
                Ok::<_, crate::Error>(log)
            })?;

        debug!(
            applied = log.applied_count(),
            unmatched = log.unmatched_count(),
            updated = log.updated_attribute_count(),
            "merge complete"
        );
        Ok((mark, log))
    }
}

/// Resolves one directive against the value document and copies its attributes.
pub fn apply_directive(value: &Document, scanned: &ScannedDirective) -> Result<MergeEntry> {
    let directive = &scanned.directive;
    let requested = directive.attrs().to_vec();

    let path = match directive.by() {
        Some(by) => match ElementPath::keyed(&scanned.element, by)? {
            Some(path) => path,
            None => {
                let path = ElementPath::positional(&scanned.element)?.to_string();
                warn!(%path, key = by, "keyed merge directive on an element without its key");
                return Ok(MergeEntry {
                    path,
                    requested,
                    outcome: MergeOutcome::MissingKey {
                        attr: by.to_string(),
                    },
                });
            }
        },
        None => ElementPath::positional(&scanned.element)?,
    };

    let counterpart = path.evaluate(value);
    let outcome = match &counterpart {
        Some(_) => MergeOutcome::Applied {
            updated: copy_attr_values(counterpart.as_ref(), &scanned.element, &requested),
        },
        None => MergeOutcome::Unmatched,
    };
    debug!(path = %path, outcome = outcome.label(), "merge directive processed");

    Ok(MergeEntry {
        path: path.to_string(),
        requested,
        outcome,
    })
}

/// Merges `value_xml` into `mark_xml` and returns the merged document as text.
///
/// This is the plain entry point: verbatim output, no log.
pub fn merge_xml(value_xml: &str, mark_xml: &str) -> Result<String> {
    XmlMerger::new()
        .merge_str(value_xml, mark_xml)
        .map(|output| output.xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;
    use crate::Error;

    #[test]
    fn test_positional_merge() {
        let value = r#"<r><a v="1"/><a v="2"/><a v="3"/></r>"#;
        let mark = r#"<r><a v="x"/><?merge?><a v="y"/><a v="z"/></r>"#;

        let output = XmlMerger::new().merge_str(value, mark).unwrap();
        assert_eq!(output.xml, r#"<r><a v="x" /><a v="2" /><a v="z" /></r>"#);
        assert_eq!(output.log.applied_count(), 1);
        assert_eq!(output.log.entries()[0].path, "/r/a[2]");
    }

    #[test]
    fn test_keyed_merge() {
        let value = r#"<r><item id="1" v="x"/><item id="2" v="y"/></r>"#;
        let mark = r#"<r><item id="1" v="?"/><?merge by="id"?><item id="2" v="?"/></r>"#;

        let xml = merge_xml(value, mark).unwrap();
        assert_eq!(xml, r#"<r><item id="1" v="?" /><item id="2" v="y" /></r>"#);
    }

    #[test]
    fn test_missing_key_is_recorded_not_fatal() {
        let value = r#"<r><item id="1" v="x"/></r>"#;
        let mark = r#"<r><?merge by="id"?><item v="?"/><?merge?><other a="m"/></r>"#;

        let output = XmlMerger::new().merge_str(value, mark).unwrap();
        assert_eq!(output.xml, r#"<r><item v="?" /><other a="m" /></r>"#);
        assert_eq!(
            output.log.entries()[0].outcome,
            MergeOutcome::MissingKey {
                attr: "id".to_string()
            }
        );
        assert_eq!(output.log.entries()[1].outcome, MergeOutcome::Unmatched);
    }

    #[test]
    fn test_merge_documents_leaves_value_untouched() {
        let value = parse_str(r#"<r><a v="live"/></r>"#).unwrap();
        let mark = parse_str(r#"<r><?merge?><a v="mark"/></r>"#).unwrap();

        let (merged, log) = XmlMerger::new().merge_documents(&value, mark).unwrap();
        assert_eq!(log.updated_attribute_count(), 1);

        let merged_a = merged.elements()[1].clone();
        assert_eq!(
            merged_a.borrow().element().unwrap().attribute("v"),
            Some("live")
        );
        assert_eq!(
            crate::xml::print_to_string(&value).unwrap(),
            r#"<r><a v="live" /></r>"#
        );
    }

    #[test]
    fn test_pretty_output() {
        let value = r#"<r><a v="1"/></r>"#;
        let mark = "<r>\n\n   <?merge?>\n<a v=\"0\"/></r>";

        let output = XmlMerger::new()
            .pretty_print(true)
            .merge_str(value, mark)
            .unwrap();
        assert_eq!(output.xml, "<r>\n  <a v=\"1\" />\n</r>");
    }

    #[test]
    fn test_malformed_inputs() {
        let good = "<r/>";
        assert!(matches!(merge_xml("<r>", good), Err(Error::MalformedXml(_))));
        assert!(matches!(merge_xml(good, "<r><a></r>"), Err(Error::MalformedXml(_))));
    }
}
