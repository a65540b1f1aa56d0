//! Push-based change notification.
//!
//! Views register a callback and re-render when it fires. Callbacks run
//! synchronously on the notifying thread after the state change has been
//! committed, so they may freely read the state that changed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`Subscribers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Rc<dyn Fn(&E)>;

/// A list of callbacks interested in events of type `E`.
pub struct Subscribers<E> {
    next_id: Cell<u64>,
    callbacks: RefCell<Vec<(SubscriptionId, Callback<E>)>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            callbacks: RefCell::new(Vec::new()),
        }
    }
}

impl<E> std::fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.len())
            .finish()
    }
}

impl<E> Subscribers<E> {
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.callbacks.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    /// Remove a callback. Returns `false` when `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every callback with `event`.
    ///
    /// The callback list is snapshotted first so a callback may subscribe or
    /// unsubscribe without tripping the borrow.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Callback<E>> = self
            .callbacks
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }
}
