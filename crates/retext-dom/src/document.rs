//! Arena-backed document tree.
//!
//! A [`Document`] owns all of its nodes. Nodes are created detached and become
//! part of the tree once inserted under the root (directly or through an
//! ancestor). Detached nodes can be moved around freely; only mutations inside
//! a subtree someone observes are reported (see [`Document::observe`]).

use std::fmt;

use crate::error::DomError;
use crate::mutation::{MutationRecord, Registration};
use crate::node::{Element, Node, NodeData, NodeId, NodeType};

/// Arena slot. The generation is bumped every time the slot is freed.
#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// In-memory document tree with mutation observers.
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    pub(crate) observers: Vec<Registration>,
    pub(crate) next_observer: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("nodes", &self.node_count())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Create an empty document containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            observers: Vec::new(),
            next_observer: 0,
        };
        doc.root = doc.alloc(NodeData::Document);
        doc
    }

    /// Create a document whose root holds the parsed `markup`.
    ///
    /// Parsing is best-effort, see [`Document::parse_fragment`].
    #[must_use]
    pub fn parse(markup: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        for node in doc.parse_fragment(markup) {
            doc.attach(root, node);
        }
        doc
    }

    /// The document root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    /// Whether `node` refers to a live node.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Payload of a live node.
    #[must_use]
    pub fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.get(node).map(|n| &n.data)
    }

    /// Kind of a live node.
    #[must_use]
    pub fn node_type(&self, node: NodeId) -> Option<NodeType> {
        self.data(node).map(NodeData::node_type)
    }

    /// Element payload, if `node` is an element.
    #[must_use]
    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.data(node) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// Character data of a text or comment node.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.data(node).and_then(NodeData::character_data)
    }

    /// Parent of a node, `None` for the root and for detached nodes.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    #[must_use]
    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).last().copied()
    }

    #[must_use]
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let (parent, position) = self.sibling_position(node)?;
        self.children(parent).get(position + 1).copied()
    }

    #[must_use]
    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let (parent, position) = self.sibling_position(node)?;
        position
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether `node` is reachable from the document root.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, node)
    }

    /// Create a detached element with the given tag.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(Element::new(tag)))
    }

    /// Create a detached element from a prepared payload.
    pub fn create_element_with(&mut self, element: Element) -> NodeId {
        self.alloc(NodeData::Element(element))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference` (or last when `None`).
    ///
    /// A child that already has a parent is moved: it is removed from its old
    /// position first, and both changes are reported.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.node(parent)?.data.is_container() {
            return Err(DomError::NotAContainer(parent));
        }
        self.node(child)?;
        if child == self.root {
            return Err(DomError::DocumentRoot);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        let mut reference = reference;
        if let Some(reference_node) = reference {
            self.node(reference_node)?;
            if self.parent(reference_node) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference_node,
                });
            }
            // Inserting a node before itself keeps it in place.
            if reference_node == child {
                reference = self.next_sibling(child);
            }
        }

        self.detach(child);

        let index = match reference {
            Some(reference_node) => self
                .sibling_position(reference_node)
                .filter(|&(p, _)| p == parent)
                .map(|(_, position)| position)
                .ok_or(DomError::NotAChild {
                    parent,
                    child: reference_node,
                })?,
            None => self.children(parent).len(),
        };
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.renumber(parent, index);
        self.queue_record(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(())
    }

    /// Remove `node` from its parent. Detached nodes are left as they are.
    ///
    /// The node stays alive and can be inserted again; use
    /// [`discard`](Self::discard) to release it.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.node(node)?;
        if node == self.root {
            return Err(DomError::DocumentRoot);
        }
        self.detach(node);
        Ok(())
    }

    /// Replace the character data of a text or comment node.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        let old_value = match &mut self.node_mut(node)?.data {
            NodeData::Text(current) | NodeData::Comment(current) => {
                std::mem::replace(current, text.into())
            }
            NodeData::Document | NodeData::Element(_) => {
                return Err(DomError::NotCharacterData(node));
            }
        };
        self.queue_record(MutationRecord::character_data(node, old_value));
        Ok(())
    }

    /// Copy `node` (and its descendants when `deep`) into a new detached node.
    ///
    /// Cloning the document root yields a detached element-like container
    /// holding copies of the root's children.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let data = self.node(node)?.data.clone();
        let copy = self.alloc(data);
        if !deep {
            return Ok(copy);
        }

        let mut stack: Vec<(NodeId, NodeId)> = self
            .children(node)
            .iter()
            .rev()
            .map(|&child| (child, copy))
            .collect();
        while let Some((source, target_parent)) = stack.pop() {
            let data = self.node(source)?.data.clone();
            let cloned = self.alloc(data);
            self.attach(target_parent, cloned);
            stack.extend(self.children(source).iter().rev().map(|&c| (c, cloned)));
        }
        Ok(copy)
    }

    /// Detach `node` and release it together with all of its descendants.
    ///
    /// Every handle into the subtree becomes stale.
    pub fn discard(&mut self, node: NodeId) -> Result<(), DomError> {
        self.node(node)?;
        if node == self.root {
            return Err(DomError::DocumentRoot);
        }
        self.detach(node);

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                continue;
            };
            if slot.generation != id.generation {
                continue;
            }
            if let Some(freed) = slot.node.take() {
                stack.extend(freed.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
        Ok(())
    }

    /// Concatenated text of all descendant text nodes, in document order.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        if let Some(NodeData::Text(text)) = self.data(node) {
            return text.clone();
        }
        let mut out = String::new();
        for descendant in self.descendants(node) {
            if let Some(NodeData::Text(text)) = self.data(descendant) {
                out.push_str(text);
            }
        }
        out
    }

    /// Descendant elements with the given tag (ASCII case-insensitive), in document order.
    #[must_use]
    pub fn elements_by_tag(&self, node: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(|e| e.tag.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// All descendants of `node` in pre-order (excluding `node` itself).
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.get(id).ok_or(DomError::StaleNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(DomError::StaleNode(id))
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.node_mut(id).ok().map(|n| &mut n.data)
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node::new(data);
        if let Some(index) = self.free.pop()
            && let Some(slot) = self.slots.get_mut(index as usize)
        {
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).expect("document exceeds u32::MAX nodes");
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Append without checks or change records. Used while building detached trees.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        let Ok(parent_node) = self.node_mut(parent) else {
            return;
        };
        let position = parent_node.children.len();
        parent_node.children.push(child);
        if let Ok(node) = self.node_mut(child) {
            node.parent = Some(parent);
            node.position = position;
        }
    }

    /// Unlink `child` from its parent, reporting the removal.
    fn detach(&mut self, child: NodeId) {
        let Some((parent, position)) = self.sibling_position(child) else {
            return;
        };
        if let Ok(parent_node) = self.node_mut(parent) {
            parent_node.children.remove(position);
        }
        if let Ok(child_node) = self.node_mut(child) {
            child_node.parent = None;
        }
        self.renumber(parent, position);
        self.queue_record(MutationRecord::child_list(parent, Vec::new(), vec![child]));
    }

    /// Parent of `node` and its index among the parent's children.
    fn sibling_position(&self, node: NodeId) -> Option<(NodeId, usize)> {
        let entry = self.get(node)?;
        let parent = entry.parent?;
        debug_assert_eq!(self.children(parent).get(entry.position), Some(&node));
        Some((parent, entry.position))
    }

    /// Refresh the stored positions of `parent`'s children from `from` on.
    fn renumber(&mut self, parent: NodeId, from: usize) {
        for position in from..self.children(parent).len() {
            let child = self.children(parent)[position];
            if let Ok(node) = self.node_mut(child) {
                node.position = position;
            }
        }
    }

    /// Unlink every child of `parent` without reporting. Returns the removed children.
    pub(crate) fn detach_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = match self.node_mut(parent) {
            Ok(node) => std::mem::take(&mut node.children),
            Err(_) => return Vec::new(),
        };
        for &child in &children {
            if let Ok(node) = self.node_mut(child) {
                node.parent = None;
            }
        }
        children
    }
}
