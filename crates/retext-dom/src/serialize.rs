//! Markup serialization.

use std::fmt::Write;

use crate::document::Document;
use crate::node::{NodeData, NodeId};

impl Document {
    /// Serialize `node` including its own tag.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Serialize the children of `node`.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        match self.data(node) {
            None => {}
            Some(NodeData::Document) => {
                for &child in self.children(node) {
                    self.write_node(child, out);
                }
            }
            Some(NodeData::Text(text)) => out.push_str(&escape_text(text)),
            Some(NodeData::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeData::Element(element)) => {
                out.push('<');
                out.push_str(&element.tag);
                for (key, value) in &element.attrs {
                    write!(out, r#" {}="{}""#, key, escape_attr(value)).unwrap();
                }
                out.push('>');
                if element.is_void() {
                    return;
                }
                for &child in self.children(node) {
                    self.write_node(child, out);
                }
                write!(out, "</{}>", element.tag).unwrap();
            }
        }
    }
}

/// Escape text content.
fn escape_text(text: &str) -> String {
    escape(text, false)
}

/// Escape an attribute value.
fn escape_attr(text: &str) -> String {
    escape(text, true)
}

fn escape(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::node::Element;

    #[test]
    fn test_outer_html_of_element() {
        let mut doc = Document::new();
        let element = doc.create_element_with(Element {
            tag: "span".to_owned(),
            attrs: vec![("title".to_owned(), r#"say "hi""#.to_owned())],
        });
        let text = doc.create_text("1 < 2 & 3");
        doc.append_child(element, text).unwrap();

        assert_eq!(
            doc.outer_html(element),
            r#"<span title="say &quot;hi&quot;">1 &lt; 2 &amp; 3</span>"#
        );
    }

    #[test]
    fn test_inner_html_of_root() {
        let doc = Document::parse("<p>a</p><!--c-->b");

        assert_eq!(doc.inner_html(doc.root()), "<p>a</p><!--c-->b");
        assert_eq!(doc.outer_html(doc.root()), "<p>a</p><!--c-->b");
    }

    #[test]
    fn test_void_element_has_no_closing_tag() {
        let mut doc = Document::new();
        let br = doc.create_element("br");

        assert_eq!(doc.outer_html(br), "<br>");
    }

    #[test]
    fn test_stale_node_serializes_to_nothing() {
        let mut doc = Document::new();
        let text = doc.create_text("gone");
        doc.discard(text).unwrap();

        assert_eq!(doc.outer_html(text), "");
    }
}
