//! Node structures for XML tree representation.
//!
//! A document is a tree of reference-counted nodes. Each node owns its
//! children and keeps a weak, navigation-only reference to its parent, so
//! the tree can be walked upward for path construction without creating
//! ownership cycles.

mod xml_content;

pub use xml_content::{
    local_part, XmlAttribute, XmlComment, XmlContent, XmlElement, XmlProcessingInstruction,
    XmlText,
};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Qualified name of the synthetic node that holds a document's top-level nodes.
pub const DOCUMENT_ROOT_TAG: &str = "$ROOT$";

/// A reference-counted pointer to a node.
pub type NodeRef = Rc<RefCell<NodeInner>>;

/// A weak pointer to a node.
pub type WeakNodeRef = Weak<RefCell<NodeInner>>;

/// The inner data of a node in the parse tree.
///
/// Each node has:
/// - 0 or more children
/// - XML content (element, text, comment, processing instruction or doctype)
/// - A parent (except for the document root)
/// - A position among siblings
#[derive(Debug)]
pub struct NodeInner {
    /// Child nodes.
    children: Vec<NodeRef>,
    /// XML content of this node.
    content: XmlContent,
    /// Weak reference to parent node.
    parent: WeakNodeRef,
    /// Zero-based position among siblings (-1 when detached or root).
    child_pos: i32,
}

impl NodeInner {
    /// Creates a new detached node with the given content.
    pub fn new(content: XmlContent) -> Self {
        NodeInner {
            children: Vec::new(),
            content,
            parent: Weak::new(),
            child_pos: -1,
        }
    }

    /// Returns the content of this node.
    pub fn content(&self) -> &XmlContent {
        &self.content
    }

    /// Returns a mutable reference to the content.
    pub fn content_mut(&mut self) -> &mut XmlContent {
        &mut self.content
    }

    /// Returns the element content, if this node is an element.
    pub fn element(&self) -> Option<&XmlElement> {
        self.content.as_element()
    }

    /// Returns the element content mutably, if this node is an element.
    pub fn element_mut(&mut self) -> Option<&mut XmlElement> {
        self.content.as_element_mut()
    }

    /// Returns true if this is the synthetic node holding a document's top level.
    pub fn is_document_root(&self) -> bool {
        matches!(&self.content, XmlContent::Element(e) if e.qname() == DOCUMENT_ROOT_TAG)
    }

    /// Returns true if this is a real (non-synthetic) element.
    pub fn is_element(&self) -> bool {
        self.content.is_element() && !self.is_document_root()
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns a reference to the child at the given index.
    pub fn child(&self, index: usize) -> Option<&NodeRef> {
        self.children.get(index)
    }

    /// Returns the children as a slice.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Returns the parent, if it is still alive.
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.upgrade()
    }

    /// Returns the child position (0-based index among siblings, -1 for root).
    pub fn child_pos(&self) -> i32 {
        self.child_pos
    }
}

/// Helper functions that work with NodeRef.
impl NodeInner {
    /// Adds a child node. Must be called on the NodeRef wrapper.
    pub fn add_child_to_ref(parent_ref: &NodeRef, child_ref: NodeRef) {
        {
            let mut child = child_ref.borrow_mut();
            child.parent = Rc::downgrade(parent_ref);
            child.child_pos = parent_ref.borrow().children.len() as i32;
        }
        parent_ref.borrow_mut().children.push(child_ref);
    }

    /// Removes the child at the given index and returns it detached.
    pub fn remove_child_to_ref(parent_ref: &NodeRef, index: usize) -> Option<NodeRef> {
        let removed = {
            let mut parent = parent_ref.borrow_mut();
            if index >= parent.children.len() {
                return None;
            }
            let removed = parent.children.remove(index);
            // Update child positions for siblings after the removal point
            for i in index..parent.children.len() {
                parent.children[i].borrow_mut().child_pos = i as i32;
            }
            removed
        };
        {
            let mut child = removed.borrow_mut();
            child.parent = Weak::new();
            child.child_pos = -1;
        }
        Some(removed)
    }
}

/// Creates a new node reference.
pub fn new_node(content: XmlContent) -> NodeRef {
    Rc::new(RefCell::new(NodeInner::new(content)))
}

/// Creates the synthetic node that holds a document's top-level nodes.
pub fn new_document_root() -> NodeRef {
    new_node(XmlContent::Element(XmlElement::new(DOCUMENT_ROOT_TAG, Vec::new())))
}

/// Returns true if both references point at the same node.
pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    Rc::ptr_eq(a, b)
}

/// Returns the ancestors of `node`, nearest first, ending at the topmost one.
///
/// For a node inside a parsed document the last entry is the synthetic root.
pub fn ancestors(node: &NodeRef) -> Vec<NodeRef> {
    let mut out = Vec::new();
    let mut current = node.borrow().parent();
    while let Some(parent) = current {
        current = parent.borrow().parent();
        out.push(parent);
    }
    out
}

/// Returns every real element below `root` in document order (pre-order).
///
/// `root` itself is included when it is a real element.
pub fn descendant_elements(root: &NodeRef) -> Vec<NodeRef> {
    let mut out = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        let borrowed = node.borrow();
        if !borrowed.content().is_element() {
            continue;
        }
        if !borrowed.is_document_root() {
            out.push(node.clone());
        }
        for child in borrowed.children().iter().rev() {
            stack.push(child.clone());
        }
    }
    out
}

/// Returns the element children of `node` whose local name is `local_name`,
/// in document order.
pub fn element_children_named(node: &NodeRef, local_name: &str) -> Vec<NodeRef> {
    node.borrow()
        .children()
        .iter()
        .filter(|child| {
            child
                .borrow()
                .element()
                .is_some_and(|e| e.local_name() == local_name)
        })
        .cloned()
        .collect()
}
