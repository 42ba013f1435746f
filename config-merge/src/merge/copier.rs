//! Attribute value copying from a counterpart element to a mark element.

use tracing::trace;

use crate::node::{same_node, NodeRef};

/// Copies the values of `names` from `counterpart` onto `target`.
///
/// Only attributes present on both sides are touched: a name missing on the
/// counterpart is skipped, and a name missing on the target is never
/// created. A missing counterpart, or one without any attributes, leaves the
/// target unchanged. Returns the names whose values were written.
pub fn copy_attr_values(
    counterpart: Option<&NodeRef>,
    target: &NodeRef,
    names: &[String],
) -> Vec<String> {
    let Some(counterpart) = counterpart else {
        return Vec::new();
    };
    if same_node(counterpart, target) {
        return Vec::new();
    }

    let values: Vec<(String, String)> = {
        let source = counterpart.borrow();
        let Some(source) = source.element().filter(|e| e.has_attributes()) else {
            return Vec::new();
        };
        names
            .iter()
            .filter_map(|name| {
                source
                    .attribute(name)
                    .map(|value| (name.clone(), value.to_string()))
            })
            .collect()
    };

    let mut target_borrowed = target.borrow_mut();
    let Some(target_element) = target_borrowed.element_mut() else {
        return Vec::new();
    };

    let mut updated = Vec::new();
    for (name, value) in values {
        if target_element.set_existing_attribute(&name, &value) {
            trace!(attr = %name, value = %value, "attribute copied");
            updated.push(name);
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{new_node, XmlAttribute, XmlContent, XmlElement};

    fn element(attrs: &[(&str, &str)]) -> NodeRef {
        new_node(XmlContent::Element(XmlElement::new(
            "add",
            attrs.iter().map(|(k, v)| XmlAttribute::new(*k, *v)).collect(),
        )))
    }

    fn attr(node: &NodeRef, name: &str) -> Option<String> {
        node.borrow()
            .element()
            .and_then(|e| e.attribute(name))
            .map(str::to_string)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_copies_requested_attributes() {
        let source = element(&[("id", "9"), ("v", "live")]);
        let target = element(&[("id", "1"), ("v", "template")]);

        let updated = copy_attr_values(Some(&source), &target, &names(&["v"]));

        assert_eq!(updated, vec!["v"]);
        assert_eq!(attr(&target, "v").as_deref(), Some("live"));
        assert_eq!(attr(&target, "id").as_deref(), Some("1"));
    }

    #[test]
    fn test_missing_on_counterpart_is_skipped() {
        let source = element(&[("other", "x")]);
        let target = element(&[("v", "template")]);

        let updated = copy_attr_values(Some(&source), &target, &names(&["v"]));

        assert!(updated.is_empty());
        assert_eq!(attr(&target, "v").as_deref(), Some("template"));
    }

    #[test]
    fn test_never_creates_target_attributes() {
        let source = element(&[("v", "live"), ("extra", "x")]);
        let target = element(&[("v", "template")]);

        let updated = copy_attr_values(Some(&source), &target, &names(&["v", "extra"]));

        assert_eq!(updated, vec!["v"]);
        assert_eq!(attr(&target, "extra"), None);
    }

    #[test]
    fn test_no_counterpart_or_no_attributes_is_noop() {
        let target = element(&[("v", "template")]);

        assert!(copy_attr_values(None, &target, &names(&["v"])).is_empty());

        let bare = element(&[]);
        assert!(copy_attr_values(Some(&bare), &target, &names(&["v"])).is_empty());
        assert_eq!(attr(&target, "v").as_deref(), Some("template"));
    }

    #[test]
    fn test_source_is_not_modified() {
        let source = element(&[("v", "live")]);
        let target = element(&[("v", "template")]);

        copy_attr_values(Some(&source), &target, &names(&["v"]));
        assert_eq!(attr(&source, "v").as_deref(), Some("live"));
    }

    #[test]
    fn test_same_node_is_noop() {
        let node = element(&[("v", "x")]);
        assert!(copy_attr_values(Some(&node), &node, &names(&["v"])).is_empty());
    }
}
