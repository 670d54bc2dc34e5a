//! Text node discovery.

use retext_dom::{Host, NodeType};

/// Every text node below `node`, in document order.
///
/// Only descendants are listed, so a text node has none. Comments are
/// skipped. The walk keeps its own stack, so arbitrarily deep trees do not
/// grow the call stack.
pub fn discover_text<H: Host>(host: &H, node: H::Node) -> Vec<H::Node> {
    let mut found = Vec::new();
    // Next unvisited sibling at each open depth.
    let mut pending = vec![host.first_child(node)];

    while let Some(entry) = pending.pop() {
        let Some(current) = entry else {
            continue;
        };
        pending.push(host.next_sibling(current));

        match host.node_type(current) {
            Some(NodeType::Text) => found.push(current),
            Some(NodeType::Element | NodeType::Document) => {
                pending.push(host.first_child(current));
            }
            Some(NodeType::Comment) | None => {}
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use retext_dom::Document;

    use super::*;

    fn texts(doc: &Document, nodes: &[retext_dom::NodeId]) -> Vec<String> {
        nodes
            .iter()
            .map(|&node| doc.text(node).unwrap_or_default().to_owned())
            .collect()
    }

    #[test]
    fn test_discover_in_document_order() {
        let doc = Document::parse("<p>one <b>two <i>three</i></b> four</p><p>five</p>");

        let found = discover_text(&doc, doc.root());

        assert_eq!(texts(&doc, &found), vec!["one ", "two ", "three", " four", "five"]);
    }

    #[test]
    fn test_comments_are_skipped() {
        let doc = Document::parse("<div>a<!--hidden-->b</div>");

        let found = discover_text(&doc, doc.root());

        assert_eq!(texts(&doc, &found), vec!["a", "b"]);
    }

    #[test]
    fn test_text_node_has_no_descendants() {
        let doc = Document::parse("<p>alone</p>");
        let text = doc.first_child(doc.first_child(doc.root()).unwrap()).unwrap();

        assert!(discover_text(&doc, text).is_empty());
    }

    #[test]
    fn test_subtree_excludes_siblings() {
        let doc = Document::parse("<p>inside</p><p>outside</p>");
        let first = doc.first_child(doc.root()).unwrap();

        let found = discover_text(&doc, first);

        assert_eq!(texts(&doc, &found), vec!["inside"]);
    }

    #[test]
    fn test_empty_and_comment_roots() {
        let mut doc = Document::new();
        let empty = doc.create_element("div");
        let comment = doc.create_comment("note");

        assert!(discover_text(&doc, empty).is_empty());
        assert!(discover_text(&doc, comment).is_empty());
    }

    #[test]
    fn test_deep_nesting() {
        let markup = format!("{}deep{}", "<div>".repeat(2_000), "</div>".repeat(2_000));
        let doc = Document::parse(&markup);

        let found = discover_text(&doc, doc.root());

        assert_eq!(texts(&doc, &found), vec!["deep"]);
    }
}
