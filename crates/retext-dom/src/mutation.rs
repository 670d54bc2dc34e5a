//! Change notification for document subtrees.
//!
//! Observers register a root and the kinds of change they care about. Every
//! mutation inside an observed subtree is queued as a [`MutationRecord`] and
//! handed to the observer's callback on the next turn of the event loop
//! ([`Document::deliver`]). Records produced while a callback runs wait for
//! the following turn, so callbacks never re-enter themselves.

use std::fmt;

use crate::document::Document;
use crate::error::DomError;
use crate::host::MutationCallback;
use crate::node::NodeId;

/// Kind of change a record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Children were added to or removed from the target.
    ChildList,
    /// The target's character data changed.
    CharacterData,
}

/// A single reported change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord<N = NodeId> {
    /// Kind of change.
    pub kind: MutationKind,
    /// Parent whose children changed, or the node whose text changed.
    pub target: N,
    /// Nodes inserted into `target` (child-list records only).
    pub added_nodes: Vec<N>,
    /// Nodes removed from `target` (child-list records only).
    pub removed_nodes: Vec<N>,
    /// Previous character data (character-data records only).
    pub old_value: Option<String>,
}

impl<N> MutationRecord<N> {
    /// Record for a change in `target`'s child list.
    pub fn child_list(target: N, added_nodes: Vec<N>, removed_nodes: Vec<N>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added_nodes,
            removed_nodes,
            old_value: None,
        }
    }

    /// Record for a change in `target`'s character data.
    pub fn character_data(target: N, old_value: String) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            old_value: Some(old_value),
        }
    }
}

/// What an observer wants to be told about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ObserveOptions {
    /// Report child-list changes.
    pub child_list: bool,
    /// Report character-data changes.
    pub character_data: bool,
    /// Report changes anywhere below the root, not only on the root itself.
    pub subtree: bool,
}

impl ObserveOptions {
    /// Structural and character-data changes anywhere in the subtree.
    #[must_use]
    pub const fn subtree_changes() -> Self {
        Self {
            child_list: true,
            character_data: true,
            subtree: true,
        }
    }

    /// Whether records of `kind` are wanted.
    #[must_use]
    pub fn accepts(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::CharacterData => self.character_data,
        }
    }
}

/// Identifier of a registered observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Observer registration with its pending records.
pub(crate) struct Registration {
    pub id: ObserverId,
    pub root: NodeId,
    pub options: ObserveOptions,
    pub queue: Vec<MutationRecord>,
    /// Taken out while the callback runs.
    pub callback: Option<MutationCallback<Document>>,
}

impl Document {
    /// Register `callback` for changes under `root`.
    ///
    /// Nothing is delivered until [`deliver`](Self::deliver) runs.
    pub fn observe(
        &mut self,
        root: NodeId,
        options: ObserveOptions,
        callback: MutationCallback<Self>,
    ) -> Result<ObserverId, DomError> {
        self.node(root)?;
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Registration {
            id,
            root,
            options,
            queue: Vec::new(),
            callback: Some(callback),
        });
        tracing::trace!(observer = %id, root = %root, "Observer registered");
        Ok(id)
    }

    /// Unregister an observer, dropping its pending records.
    ///
    /// Returns `false` if the observer was not registered.
    pub fn disconnect(&mut self, observer: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|reg| reg.id != observer);
        self.observers.len() != before
    }

    /// Take the records queued for an observer without running its callback.
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .iter_mut()
            .find(|reg| reg.id == observer)
            .map(|reg| std::mem::take(&mut reg.queue))
            .unwrap_or_default()
    }

    /// Whether any observer has records waiting for delivery.
    #[must_use]
    pub fn has_pending_records(&self) -> bool {
        self.observers.iter().any(|reg| !reg.queue.is_empty())
    }

    /// Run one turn of the event loop.
    ///
    /// Every observer with queued records receives the batch queued before
    /// this turn started. Returns `false` if there was nothing to deliver.
    pub fn deliver(&mut self) -> bool {
        let batches: Vec<(ObserverId, Vec<MutationRecord>)> = self
            .observers
            .iter_mut()
            .filter(|reg| !reg.queue.is_empty())
            .map(|reg| (reg.id, std::mem::take(&mut reg.queue)))
            .collect();
        if batches.is_empty() {
            return false;
        }

        for (id, records) in batches {
            // An earlier callback in this turn may have disconnected the observer.
            let Some(mut callback) = self
                .observers
                .iter_mut()
                .find(|reg| reg.id == id)
                .and_then(|reg| reg.callback.take())
            else {
                continue;
            };
            tracing::trace!(observer = %id, records = records.len(), "Delivering mutation records");
            callback(self, &records);
            if let Some(reg) = self.observers.iter_mut().find(|reg| reg.id == id) {
                reg.callback = Some(callback);
            }
        }
        true
    }

    /// Run turns until no records are pending.
    ///
    /// Returns the number of turns run.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Unsettled`] if records are still pending after
    /// `turn_limit` turns.
    pub fn run_until_idle(&mut self, turn_limit: usize) -> Result<usize, DomError> {
        let mut turns = 0;
        while self.has_pending_records() {
            if turns == turn_limit {
                return Err(DomError::Unsettled { turns });
            }
            self.deliver();
            turns += 1;
        }
        Ok(turns)
    }

    /// Queue `record` for every observer whose subtree contains its target.
    pub(crate) fn queue_record(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let mut interested: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, reg)| reg.options.accepts(record.kind) && self.observes(reg, record.target))
            .map(|(index, _)| index)
            .collect();
        let Some(last) = interested.pop() else {
            return;
        };
        for index in interested {
            if let Some(reg) = self.observers.get_mut(index) {
                reg.queue.push(record.clone());
            }
        }
        if let Some(reg) = self.observers.get_mut(last) {
            reg.queue.push(record);
        }
    }

    fn observes(&self, reg: &Registration, target: NodeId) -> bool {
        if reg.options.subtree {
            self.is_inclusive_ancestor(reg.root, target)
        } else {
            reg.root == target
        }
    }
}
