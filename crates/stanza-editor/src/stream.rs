//! Patch stream and change notifications.
//!
//! Both hubs are synchronous callback registries: listeners are invoked in
//! registration order, inside the processing pass that produced the event.
//! There is no queueing or asynchrony; ordered delivery within a pass is
//! all the cooperative single-threaded model requires.

use std::collections::BTreeMap;

use stanza_patch::{Patch, PatchBatch};
use stanza_types::{Document, Selection};

/// Identifier for a registered listener.
pub type ListenerId = u64;

/// Registry publishing committed patch batches to the document store and
/// other consumers.
#[derive(Default)]
pub struct PatchHub {
    next_id: ListenerId,
    listeners: BTreeMap<ListenerId, Box<dyn FnMut(&PatchBatch)>>,
}

impl PatchHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning its id.
    pub fn on<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&PatchBatch) + 'static,
    {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn emit(&mut self, batch: &PatchBatch) {
        for listener in self.listeners.values_mut() {
            listener(batch);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for PatchHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchHub")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Opaque change events emitted after each processing pass.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent {
    /// The document value changed; carries the patches of the pass.
    Mutation { patches: Vec<Patch> },
    /// The selection after the pass settled.
    SelectionChanged { selection: Option<Selection> },
    /// An operation was vetoed.
    Blocked { reason: BlockedReason },
    /// A full value snapshot, emitted on install and after undo/redo.
    Value { snapshot: Document },
}

/// Why an operation was vetoed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockedReason {
    /// The configured maximum block count would be exceeded.
    MaxBlocks,
    /// The inserted node's type is not in the schema.
    UnknownType,
}

/// Registry for change events, mirroring `PatchHub`.
#[derive(Default)]
pub struct ChangeHub {
    next_id: ListenerId,
    listeners: BTreeMap<ListenerId, Box<dyn FnMut(&ChangeEvent)>>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn emit(&mut self, event: &ChangeEvent) {
        for listener in self.listeners.values_mut() {
            listener(event);
        }
    }
}

impl std::fmt::Debug for ChangeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeHub")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use stanza_patch::PatchOrigin;

    #[test]
    fn test_on_off_emit() {
        let seen = Rc::new(RefCell::new(0usize));
        let mut hub = PatchHub::new();
        let seen2 = Rc::clone(&seen);
        let id = hub.on(move |_| *seen2.borrow_mut() += 1);

        let batch = PatchBatch {
            patches: Vec::new(),
            snapshot: Document::default(),
            origin: PatchOrigin::Local,
        };
        hub.emit(&batch);
        assert_eq!(*seen.borrow(), 1);

        assert!(hub.off(id));
        assert!(!hub.off(id));
        hub.emit(&batch);
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut hub = ChangeHub::new();
        for tag in 0..3 {
            let order = Rc::clone(&order);
            hub.on(move |_| order.borrow_mut().push(tag));
        }
        hub.emit(&ChangeEvent::SelectionChanged { selection: None });
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }
}
