//! Match validation on disposable copies.
//!
//! The live tree is never consulted directly: the candidate is deep-cloned,
//! the clone is searched and then released again.

use regex::Regex;
use retext_dom::{Host, NodeType};

use crate::discover::discover_text;

/// Tag of the throwaway element that wraps cloned text nodes.
pub(crate) const SCRATCH_TAG: &str = "div";

/// Whether `pattern` matches any text inside `target`.
///
/// `target` may be any node, live or detached. It is cloned deeply; a cloned
/// text node is wrapped in a scratch container before the walk. The clone is
/// discarded before returning, so the host ends up with the same nodes it
/// started with.
pub fn matches<H: Host>(host: &mut H, pattern: &Regex, target: H::Node) -> Result<bool, H::Error> {
    let clone = host.clone_node(target, true)?;
    let scope = if host.node_type(clone) == Some(NodeType::Text) {
        let container = host.create_element(SCRATCH_TAG);
        if let Err(e) = host.append_child(container, clone) {
            host.discard(clone)?;
            host.discard(container)?;
            return Err(e);
        }
        container
    } else {
        clone
    };

    let found = discover_text(host, scope)
        .into_iter()
        .any(|node| host.text(node).is_some_and(|text| pattern.is_match(text)));
    host.discard(scope)?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use retext_dom::{Document, MutationRecord, ObserveOptions};

    use super::*;

    fn first_text(doc: &Document) -> retext_dom::NodeId {
        discover_text(doc, doc.root())[0]
    }

    #[test]
    fn test_text_node_matches() {
        let mut doc = Document::parse("<p>the cat sat</p>");
        let text = first_text(&doc);

        assert!(matches(&mut doc, &Regex::new("cat").unwrap(), text).unwrap());
        assert!(!matches(&mut doc, &Regex::new("dog").unwrap(), text).unwrap());
    }

    #[test]
    fn test_element_matches_any_descendant_text() {
        let mut doc = Document::parse("<div><p>one</p><p>two <b>PRICE</b></p></div>");
        let root = doc.root();

        assert!(matches(&mut doc, &Regex::new("PRICE").unwrap(), root).unwrap());
    }

    #[test]
    fn test_text_split_across_nodes_does_not_match() {
        let mut doc = Document::parse("<p>ca<b>t</b></p>");
        let root = doc.root();

        assert!(!matches(&mut doc, &Regex::new("cat").unwrap(), root).unwrap());
    }

    #[test]
    fn test_comment_text_is_ignored() {
        let mut doc = Document::parse("<p><!--cat--></p>");
        let root = doc.root();

        assert!(!matches(&mut doc, &Regex::new("cat").unwrap(), root).unwrap());
    }

    #[test]
    fn test_detached_candidate() {
        let mut doc = Document::new();
        let container = doc.create_element("div");
        doc.set_inner_html(container, "<b>dog</b> food").unwrap();

        assert!(matches(&mut doc, &Regex::new("food").unwrap(), container).unwrap());
        assert!(doc.contains(container));
        assert_eq!(doc.inner_html(container), "<b>dog</b> food");
    }

    #[test]
    fn test_live_tree_is_left_alone() {
        let mut doc = Document::parse("<p>cat <i>cat</i></p>");
        let root = doc.root();
        let before_html = doc.inner_html(root);
        let before_count = doc.node_count();
        let log: Rc<RefCell<Vec<MutationRecord>>> = Rc::default();
        let sink = Rc::clone(&log);
        doc.observe(
            root,
            ObserveOptions::subtree_changes(),
            Box::new(move |_: &mut Document, records: &[MutationRecord]| {
                sink.borrow_mut().extend_from_slice(records);
            }),
        )
        .unwrap();
        let text = first_text(&doc);

        assert!(matches(&mut doc, &Regex::new("cat").unwrap(), text).unwrap());
        assert!(matches(&mut doc, &Regex::new("cat").unwrap(), root).unwrap());

        assert_eq!(doc.inner_html(root), before_html);
        assert_eq!(doc.node_count(), before_count);
        assert!(!doc.has_pending_records());
        doc.deliver();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_stale_target_is_an_error() {
        let mut doc = Document::new();
        let text = doc.create_text("gone");
        doc.discard(text).unwrap();

        assert!(matches(&mut doc, &Regex::new("gone").unwrap(), text).is_err());
    }
}
