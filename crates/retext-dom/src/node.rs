//! Node handles and payloads.

use std::fmt;

/// Handle to a node owned by a [`Document`](crate::Document).
///
/// Handles are generational: once a node is discarded its slot may be reused,
/// and the old handle is reported as stale instead of aliasing the new node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Kind of a node, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// The document root.
    Document,
    /// An element with a tag name and attributes.
    Element,
    /// A text leaf.
    Text,
    /// A comment leaf.
    Comment,
}

/// Element tag and attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name as written in markup (e.g., "b", "div").
    pub tag: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
}

impl Element {
    /// Create an element with no attributes.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    /// Look up an attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether this is an HTML void element (never has children).
    #[must_use]
    pub fn is_void(&self) -> bool {
        is_void_tag(&self.tag)
    }
}

/// Node payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    /// The document root container.
    Document,
    /// Element node.
    Element(Element),
    /// Text node content.
    Text(String),
    /// Comment content.
    Comment(String),
}

impl NodeData {
    /// Payload-free kind of this node.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document => NodeType::Document,
            Self::Element(_) => NodeType::Element,
            Self::Text(_) => NodeType::Text,
            Self::Comment(_) => NodeType::Comment,
        }
    }

    /// Character data carried by text and comment nodes.
    #[must_use]
    pub fn character_data(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Comment(text) => Some(text),
            Self::Document | Self::Element(_) => None,
        }
    }

    /// Whether this node may hold children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Document | Self::Element(_))
    }
}

/// HTML void elements.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub(crate) fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

/// Arena entry for a live node.
#[derive(Debug)]
pub(crate) struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    /// Index in the parent's `children`. Stale while detached.
    pub position: usize,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            position: 0,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_attr_lookup() {
        let element = Element {
            tag: "a".to_owned(),
            attrs: vec![
                ("href".to_owned(), "/x".to_owned()),
                ("class".to_owned(), "link".to_owned()),
            ],
        };

        assert_eq!(element.attr("class"), Some("link"));
        assert_eq!(element.attr("id"), None);
    }

    #[test]
    fn test_void_tags_are_case_insensitive() {
        assert!(Element::new("br").is_void());
        assert!(Element::new("IMG").is_void());
        assert!(!Element::new("b").is_void());
    }

    #[test]
    fn test_character_data() {
        assert_eq!(NodeData::Text("hi".to_owned()).character_data(), Some("hi"));
        assert_eq!(NodeData::Comment("c".to_owned()).character_data(), Some("c"));
        assert_eq!(NodeData::Element(Element::new("p")).character_data(), None);
    }

    #[test]
    fn test_node_id_display() {
        let id = NodeId {
            index: 3,
            generation: 1,
        };
        assert_eq!(id.to_string(), "#3v1");
    }
}
