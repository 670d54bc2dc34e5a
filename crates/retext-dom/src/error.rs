//! Error types for document operations.

use crate::node::NodeId;

/// Error from a document tree operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DomError {
    /// The handle refers to a node that was discarded.
    #[error("node {0} no longer exists")]
    StaleNode(NodeId),

    /// The reference node is not a child of the given parent.
    #[error("node {child} is not a child of {parent}")]
    NotAChild {
        /// Expected parent.
        parent: NodeId,
        /// Node that was expected to be its child.
        child: NodeId,
    },

    /// Insertion would make a node its own ancestor.
    #[error("cannot insert {child} into {parent}: node would contain itself")]
    HierarchyRequest {
        /// Insertion target.
        parent: NodeId,
        /// Node being inserted.
        child: NodeId,
    },

    /// Text and comment nodes cannot hold children.
    #[error("node {0} cannot have children")]
    NotAContainer(NodeId),

    /// Only text and comment nodes carry character data.
    #[error("node {0} has no character data")]
    NotCharacterData(NodeId),

    /// The document root cannot be moved, removed or discarded.
    #[error("the document root cannot be detached")]
    DocumentRoot,

    /// Observers were still being notified after the turn limit.
    #[error("event loop still busy after {turns} turns")]
    Unsettled {
        /// Number of turns that were run.
        turns: usize,
    },
}
