//! Typed element paths.
//!
//! A path names an element by the chain of element names from the document
//! element down to it. Each step narrows the same-named children of the
//! previous step either by 1-based position or by an attribute value. Paths
//! are evaluated by walking the other tree directly; the textual form exists
//! for log output only.

use std::fmt;

use crate::error::{Error, Result};
use crate::node::{ancestors, element_children_named, same_node, NodeRef};
use crate::xml::Document;

/// How a path step chooses among same-named children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// The element is the only child with this name.
    Only,
    /// 1-based position among same-named siblings.
    Ordinal(usize),
    /// The child whose attribute `attr` equals `value`.
    Keyed {
        /// Attribute name.
        attr: String,
        /// Required attribute value.
        value: String,
    },
}

/// One step of an element path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    /// Local name of the element.
    pub name: String,
    /// Selector among same-named siblings.
    pub selector: Selector,
}

impl PathStep {
    /// Selects the matching children of `context`, in document order.
    fn select(&self, context: &NodeRef) -> Vec<NodeRef> {
        let candidates = element_children_named(context, &self.name);
        match &self.selector {
            Selector::Only => candidates,
            Selector::Ordinal(n) => n
                .checked_sub(1)
                .and_then(|i| candidates.get(i).cloned())
                .into_iter()
                .collect(),
            Selector::Keyed { attr, value } => candidates
                .into_iter()
                .filter(|node| {
                    node.borrow()
                        .element()
                        .and_then(|e| e.attribute(attr))
                        .is_some_and(|v| v == value.as_str())
                })
                .collect(),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name)?;
        match &self.selector {
            Selector::Only => Ok(()),
            Selector::Ordinal(n) => write!(f, "[{}]", n),
            Selector::Keyed { attr, value } => write!(f, "[@{}={}]", attr, quote_literal(value)),
        }
    }
}

/// Quotes a value as a path literal, whatever quotes it contains.
fn quote_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// An absolute path from the document element to one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    steps: Vec<PathStep>,
}

impl ElementPath {
    /// Builds a path from explicit steps.
    pub fn new(steps: Vec<PathStep>) -> Self {
        ElementPath { steps }
    }

    /// Builds the positional path of `element` within its own document.
    pub fn positional(element: &NodeRef) -> Result<Self> {
        let steps = element_chain(element)?
            .iter()
            .map(positional_step)
            .collect::<Result<Vec<_>>>()?;
        Ok(ElementPath { steps })
    }

    /// Builds a path whose last step selects by the element's own `by` attribute.
    ///
    /// Returns `Ok(None)` when the element does not carry that attribute.
    pub fn keyed(element: &NodeRef, by: &str) -> Result<Option<Self>> {
        let value = match element.borrow().element().and_then(|e| e.attribute(by)) {
            Some(value) => value.to_string(),
            None => return Ok(None),
        };

        let mut path = Self::positional(element)?;
        if let Some(last) = path.steps.last_mut() {
            last.selector = Selector::Keyed {
                attr: by.to_string(),
                value,
            };
        }
        Ok(Some(path))
    }

    /// Returns the steps of this path.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Finds the element this path names in `doc`.
    ///
    /// Every step is applied to all nodes selected by the previous one; when
    /// several elements match in the end, the first in document order wins.
    /// No match at any step yields `None`.
    pub fn evaluate(&self, doc: &Document) -> Option<NodeRef> {
        if self.steps.is_empty() {
            return None;
        }
        let mut context = vec![doc.root().clone()];
        for step in &self.steps {
            let next: Vec<NodeRef> = context.iter().flat_map(|node| step.select(node)).collect();
            if next.is_empty() {
                return None;
            }
            context = next;
        }
        context.into_iter().next()
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// Returns the elements from the document element down to `element`.
fn element_chain(element: &NodeRef) -> Result<Vec<NodeRef>> {
    if !element.borrow().is_element() {
        return Err(Error::InvalidElement(
            "only elements have a path".to_string(),
        ));
    }

    let mut above = ancestors(element);
    let top = above.pop();
    let attached = top
        .as_ref()
        .is_some_and(|top| top.borrow().is_document_root());
    if !attached {
        return Err(Error::InvalidElement(format!(
            "<{}> is not attached to a document",
            describe(element)
        )));
    }

    let mut chain: Vec<NodeRef> = above.into_iter().rev().collect();
    chain.push(element.clone());
    Ok(chain)
}

/// Positional step for one element of a chain.
fn positional_step(node: &NodeRef) -> Result<PathStep> {
    let name = node
        .borrow()
        .element()
        .map(|e| e.local_name().to_string())
        .ok_or_else(|| Error::InvalidElement("only elements have a path".to_string()))?;
    let parent = node
        .borrow()
        .parent()
        .ok_or_else(|| Error::InvalidElement(format!("<{}> has no parent", name)))?;

    let siblings = element_children_named(&parent, &name);
    let index = siblings
        .iter()
        .position(|sibling| same_node(sibling, node))
        .ok_or_else(|| {
            Error::InvalidElement(format!("<{}> is missing from its parent's children", name))
        })?;

    let selector = if siblings.len() == 1 {
        Selector::Only
    } else {
        Selector::Ordinal(index + 1)
    };
    Ok(PathStep { name, selector })
}

fn describe(node: &NodeRef) -> String {
    node.borrow()
        .element()
        .map(|e| e.qname().to_string())
        .unwrap_or_default()
}
