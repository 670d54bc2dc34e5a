//! Host capabilities consumed by the rewriting engine.
//!
//! The engine never owns nodes. It reads and edits whatever tree the host
//! provides through this trait and relies on the host to report changes.
//! [`Document`] is the in-memory implementation.

use std::fmt::Debug;
use std::hash::Hash;

use crate::document::Document;
use crate::error::DomError;
use crate::mutation::{MutationRecord, ObserveOptions, ObserverId};
use crate::node::{NodeId, NodeType};

/// Callback invoked with each delivered batch of change records.
pub type MutationCallback<H> = Box<dyn FnMut(&mut H, &[MutationRecord<<H as Host>::Node>])>;

/// A document tree the engine can read, edit and observe.
pub trait Host: Sized {
    /// Node handle. Cheap to copy; the host owns the node itself.
    type Node: Copy + Eq + Hash + Debug + 'static;
    /// Error reported by tree operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Kind of `node`, `None` if it no longer exists.
    fn node_type(&self, node: Self::Node) -> Option<NodeType>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn first_child(&self, node: Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Character data of a text or comment node.
    fn text(&self, node: Self::Node) -> Option<&str>;

    fn set_text(&mut self, node: Self::Node, text: String) -> Result<(), Self::Error>;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> Self::Node;

    /// Insert `child` before `reference`, or last when `reference` is `None`.
    fn insert_before(
        &mut self,
        parent: Self::Node,
        child: Self::Node,
        reference: Option<Self::Node>,
    ) -> Result<(), Self::Error>;

    fn append_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), Self::Error> {
        self.insert_before(parent, child, None)
    }

    /// Detach `node` from its parent.
    fn remove(&mut self, node: Self::Node) -> Result<(), Self::Error>;

    /// Copy `node` into a new detached node.
    fn clone_node(&mut self, node: Self::Node, deep: bool) -> Result<Self::Node, Self::Error>;

    /// Replace the children of `container` with parsed `markup`.
    fn set_inner_html(&mut self, container: Self::Node, markup: &str) -> Result<(), Self::Error>;

    /// Release a subtree the caller created and no longer needs.
    fn discard(&mut self, node: Self::Node) -> Result<(), Self::Error>;

    /// Register `callback` for changes under `root`.
    fn observe(
        &mut self,
        root: Self::Node,
        options: ObserveOptions,
        callback: MutationCallback<Self>,
    ) -> Result<ObserverId, Self::Error>;

    /// Unregister an observer. Returns `false` if it was not registered.
    fn disconnect(&mut self, observer: ObserverId) -> bool;
}

impl Host for Document {
    type Node = NodeId;
    type Error = DomError;

    fn node_type(&self, node: NodeId) -> Option<NodeType> {
        Document::node_type(self, node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        Document::parent(self, node)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        Document::first_child(self, node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        Document::next_sibling(self, node)
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        Document::text(self, node)
    }

    fn set_text(&mut self, node: NodeId, text: String) -> Result<(), DomError> {
        Document::set_text(self, node, text)
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        Document::create_element(self, tag)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        Document::insert_before(self, parent, child, reference)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        Document::append_child(self, parent, child)
    }

    fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        Document::remove(self, node)
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        Document::clone_node(self, node, deep)
    }

    fn set_inner_html(&mut self, container: NodeId, markup: &str) -> Result<(), DomError> {
        Document::set_inner_html(self, container, markup)
    }

    fn discard(&mut self, node: NodeId) -> Result<(), DomError> {
        Document::discard(self, node)
    }

    fn observe(
        &mut self,
        root: NodeId,
        options: ObserveOptions,
        callback: MutationCallback<Self>,
    ) -> Result<ObserverId, DomError> {
        Document::observe(self, root, options, callback)
    }

    fn disconnect(&mut self, observer: ObserverId) -> bool {
        Document::disconnect(self, observer)
    }
}
