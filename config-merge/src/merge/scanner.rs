//! Directive discovery in the mark document.
//!
//! A directive belongs to the element that follows it. Walking backward from
//! an element, comments, other processing instructions and whitespace-only
//! text are stepped over; the first `<?merge ...?>` found is the element's
//! directive. Any other node (significant text, another element) or the
//! start of the sibling list means the element has no directive.
//!
//! Merge instructions must never reach the output, so any that did not
//! attach to an element are removed once the scan is done.

use tracing::debug;

use super::directive::MergeDirective;
use crate::node::{NodeInner, NodeRef, XmlContent};
use crate::xml::Document;

/// Processing-instruction target that marks a merge directive.
pub const MERGE_TARGET: &str = "merge";

/// A mark element together with the directive that preceded it.
#[derive(Debug, Clone)]
pub struct ScannedDirective {
    /// The mark element the directive applies to.
    pub element: NodeRef,
    /// The parsed directive.
    pub directive: MergeDirective,
    /// The raw instruction data, for diagnostics.
    pub data: String,
}

/// What the backward scan found at one sibling.
enum ScanStep {
    Skip,
    Directive(String),
    Stop,
}

fn classify(content: &XmlContent) -> ScanStep {
    match content {
        XmlContent::Comment(_) => ScanStep::Skip,
        XmlContent::Text(text) if text.is_whitespace() => ScanStep::Skip,
        XmlContent::ProcessingInstruction(pi) if pi.target() == MERGE_TARGET => {
            ScanStep::Directive(pi.content().to_string())
        }
        XmlContent::ProcessingInstruction(_) => ScanStep::Skip,
        _ => ScanStep::Stop,
    }
}

/// Finds every directive in the mark document, removing all merge
/// instructions from the tree.
///
/// Elements are visited in document order, so the result is in document
/// order as well.
pub fn scan_directives(mark: &Document) -> Vec<ScannedDirective> {
    let scanned = collect_directives(mark);
    let orphans = strip_orphans(mark.root());
    if orphans > 0 {
        debug!(orphans, "removed merge instructions not followed by an element");
    }
    scanned
}

fn collect_directives(mark: &Document) -> Vec<ScannedDirective> {
    mark.elements()
        .into_iter()
        .filter_map(|element| {
            let data = take_directive(&element)?;
            let directive = {
                let borrowed = element.borrow();
                let xml_element = borrowed.element()?;
                MergeDirective::for_element(xml_element, &data)
            };
            Some(ScannedDirective {
                element,
                directive,
                data,
            })
        })
        .collect()
}

/// Detaches the directive preceding `element` and returns its data.
fn take_directive(element: &NodeRef) -> Option<String> {
    let parent = element.borrow().parent()?;
    let pos = usize::try_from(element.borrow().child_pos()).ok()?;

    let (index, data) = {
        let parent_borrowed = parent.borrow();
        let mut found = None;
        for index in (0..pos).rev() {
            let sibling = parent_borrowed.child(index)?;
            match classify(sibling.borrow().content()) {
                ScanStep::Skip => continue,
                ScanStep::Directive(data) => {
                    found = Some((index, data));
                    break;
                }
                ScanStep::Stop => return None,
            }
        }
        found?
    };

    NodeInner::remove_child_to_ref(&parent, index);
    collapse_blank_line(&parent, index);
    Some(data)
}

/// Removes merge instructions left anywhere under `root`; returns how many.
fn strip_orphans(root: &NodeRef) -> usize {
    let mut removed = 0;
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        let mut index = 0;
        loop {
            let child = match node.borrow().child(index) {
                Some(child) => child.clone(),
                None => break,
            };
            let is_directive = matches!(
                child.borrow().content(),
                XmlContent::ProcessingInstruction(pi) if pi.target() == MERGE_TARGET
            );
            if is_directive {
                NodeInner::remove_child_to_ref(&node, index);
                if collapse_blank_line(&node, index) {
                    index -= 1;
                }
                removed += 1;
            } else {
                if child.borrow().content().is_element() {
                    stack.push(child);
                }
                index += 1;
            }
        }
    }
    removed
}

/// Removes the indentation left behind by an instruction that sat on its own line.
///
/// After the instruction at `index` is gone, whitespace text on both sides of
/// the gap would print as an empty line; the leading run is dropped. Returns
/// true if a node was removed.
fn collapse_blank_line(parent: &NodeRef, index: usize) -> bool {
    if index == 0 {
        return false;
    }
    let is_blank = |i: usize| {
        parent
            .borrow()
            .child(i)
            .is_some_and(|n| n.borrow().content().as_text().is_some_and(|t| t.is_whitespace()))
    };
    if is_blank(index - 1) && is_blank(index) {
        NodeInner::remove_child_to_ref(parent, index - 1);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{parse_str, print_to_string};

    fn scanned_names(directives: &[ScannedDirective]) -> Vec<String> {
        directives
            .iter()
            .map(|d| d.element.borrow().element().unwrap().qname().to_string())
            .collect()
    }

    #[test]
    fn test_directive_directly_before_element() {
        let doc = parse_str(r#"<root><?merge by="id"?><item id="1"/></root>"#).unwrap();
        let directives = scan_directives(&doc);

        assert_eq!(directives.len(), 1);
        assert_eq!(scanned_names(&directives), vec!["item"]);
        assert_eq!(directives[0].directive.by(), Some("id"));
        assert_eq!(directives[0].data, r#"by="id""#);
        assert_eq!(print_to_string(&doc).unwrap(), r#"<root><item id="1" /></root>"#);
    }

    #[test]
    fn test_comments_and_other_instructions_are_skipped() {
        let doc = parse_str(
            r#"<root><?merge?><!-- a --><?other x?><!-- b --><item id="1"/></root>"#,
        )
        .unwrap();
        let directives = scan_directives(&doc);

        assert_eq!(directives.len(), 1);
        assert_eq!(
            print_to_string(&doc).unwrap(),
            r#"<root><!-- a --><?other x?><!-- b --><item id="1" /></root>"#
        );
    }

    #[test]
    fn test_text_or_element_blocks_the_scan() {
        let doc = parse_str(r#"<root><?merge?>text<a/><?merge?><b/><c/></root>"#).unwrap();
        let directives = scan_directives(&doc);

        // <a> is blocked by text, <b> gets its directive, <c> is blocked by <b>
        assert_eq!(scanned_names(&directives), vec!["b"]);
        let output = print_to_string(&doc).unwrap();
        assert_eq!(output, r#"<root>text<a /><b /><c /></root>"#);
    }

    #[test]
    fn test_only_nearest_directive_is_consumed() {
        let doc = parse_str(r#"<root><?merge attr="x"?><?merge attr="y"?><e x="1" y="2"/></root>"#)
            .unwrap();
        let directives = scan_directives(&doc);

        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].directive.attrs(), ["y"]);
        assert_eq!(
            print_to_string(&doc).unwrap(),
            r#"<root><e x="1" y="2" /></root>"#
        );
    }

    #[test]
    fn test_directive_on_own_line_leaves_no_blank_line() {
        let xml = "<root>\n  <?merge?>\n  <a v=\"1\"/>\n</root>";
        let doc = parse_str(xml).unwrap();
        let directives = scan_directives(&doc);

        assert_eq!(directives.len(), 1);
        assert_eq!(
            print_to_string(&doc).unwrap(),
            "<root>\n  <a v=\"1\" />\n</root>"
        );
    }

    #[test]
    fn test_document_order_and_nesting() {
        let xml = r#"<?merge?><root a="1"><?merge?><x/><y><?merge?><z/></y></root>"#;
        let doc = parse_str(xml).unwrap();
        let directives = scan_directives(&doc);

        assert_eq!(scanned_names(&directives), vec!["root", "x", "z"]);
        assert_eq!(print_to_string(&doc).unwrap(), "<root a=\"1\"><x /><y><z /></y></root>");
    }

    #[test]
    fn test_orphan_instructions_are_removed() {
        let xml = "<root>\n  <a>\n    <?merge?>\n  </a>\n  <?merge?>\n  <!-- end -->\n</root>";
        let doc = parse_str(xml).unwrap();
        let directives = scan_directives(&doc);

        assert!(directives.is_empty());
        assert_eq!(
            print_to_string(&doc).unwrap(),
            "<root>\n  <a>\n  </a>\n  <!-- end -->\n</root>"
        );
    }

    #[test]
    fn test_no_directives() {
        let doc = parse_str(r#"<root><a/></root>"#).unwrap();
        assert!(scan_directives(&doc).is_empty());
    }
}
