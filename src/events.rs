use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Rc<RefCell<dyn FnMut(&E)>>;

/// Single-threaded listener registry.
///
/// Listeners run synchronously in registration order. `emit` works on a
/// snapshot, so a listener may subscribe or unsubscribe while an event is
/// being delivered; the change takes effect from the next event. A listener
/// that re-enters `emit` for its own hub is skipped for the nested event.
pub struct EventHub<E> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(SubscriptionId, Listener<E>)>>,
}

impl<E> EventHub<E> {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let listener: Listener<E> = Rc::new(RefCell::new(listener));
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            match listener.try_borrow_mut() {
                Ok(mut call) => (*call)(event),
                Err(_) => tracing::trace!("skipping re-entrant listener"),
            }
        }
    }
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}
