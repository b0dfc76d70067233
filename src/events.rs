// Change notifications published by the store

use crate::models::Task;
use std::cell::{Cell, RefCell};
use uuid::Uuid;

/// A mutation that the store has already committed.
///
/// `Added` and `Edited` carry the full task so subscribers can update
/// derived state without querying the store from inside the callback.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Added(Task),
    Edited(Task),
    Deleted(Uuid),
    Cleared,
    Imported(usize),
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn Fn(&TaskEvent)>;

/// Registry of change callbacks.
///
/// Events are delivered synchronously on the mutating call's thread, in
/// subscription order. Everything here is single-threaded by design;
/// callbacks must not subscribe or unsubscribe from inside a delivery.
#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<Vec<(u64, Callback)>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every subsequent event.
    pub fn subscribe(&self, callback: impl Fn(&TaskEvent) + 'static) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers.borrow_mut().push((id, Box::new(callback)));
        SubscriptionId(id)
    }

    /// Drop a previously registered callback. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.borrow_mut().retain(|(sub_id, _)| *sub_id != id.0);
    }

    pub(crate) fn emit(&self, event: &TaskEvent) {
        for (_, callback) in self.subscribers.borrow().iter() {
            callback(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}
