//! Small publish/subscribe wrapper around a value.
//!
//! The scrubber exposes the current time through a [`Signal`] so renderers can
//! follow it frame by frame without pulling full store snapshots.

use std::{cell::RefCell, fmt, rc::Rc};

/// Identifies a listener registered with [`Signal::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Box<dyn FnMut(&T)>;

struct Inner<T> {
    value: T,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
    notifying: bool,
    removed_while_notifying: Vec<SubscriptionId>,
}

/// Shared observable value. Clones share the same value and listeners.
pub struct Signal<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

/// The continuously updating playhead position in seconds.
pub type TimeSignal = Signal<f64>;

impl<T: Clone + PartialEq> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                next_id: 0,
                listeners: Vec::new(),
                notifying: false,
                removed_while_notifying: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Stores `value` and notifies listeners when it differs from the
    /// previous value. Returns whether a change happened.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
        }
        self.notify();
        true
    }

    /// Registers `listener`; it is called after every change, not immediately.
    pub fn subscribe(&self, listener: impl FnMut(&T) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Unknown or already removed ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.retain(|(existing, _)| *existing != id);
        if inner.notifying {
            inner.removed_while_notifying.push(id);
        }
    }

    pub fn clear_subscribers(&self) {
        let mut inner = self.inner.borrow_mut();
        let ids: Vec<_> = inner.listeners.iter().map(|(id, _)| *id).collect();
        inner.listeners.clear();
        if inner.notifying {
            inner.removed_while_notifying.extend(ids);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn notify(&self) {
        // Listeners run without the borrow held so they may read or set the
        // signal themselves.
        let (value, mut listeners) = {
            let mut inner = self.inner.borrow_mut();
            if inner.notifying {
                return;
            }
            inner.notifying = true;
            (inner.value.clone(), std::mem::take(&mut inner.listeners))
        };

        for (_, listener) in listeners.iter_mut() {
            listener(&value);
        }

        let pending = {
            let mut inner = self.inner.borrow_mut();
            let removed = std::mem::take(&mut inner.removed_while_notifying);
            listeners.retain(|(id, _)| !removed.contains(id));
            let added = std::mem::take(&mut inner.listeners);
            listeners.extend(added);
            inner.listeners = listeners;
            inner.notifying = false;
            inner.value != value
        };

        // A listener changed the value mid-notification.
        if pending {
            self.notify();
        }
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn notifies_on_change_only() {
        let signal = TimeSignal::new(0.0);
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        signal.subscribe(move |_| seen.set(seen.get() + 1));

        assert!(signal.set(1.0));
        assert!(!signal.set(1.0));
        assert!(signal.set(2.0));
        assert_eq!(calls.get(), 2);
        assert_eq!(signal.get(), 2.0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let signal = TimeSignal::new(0.0);
        let last = Rc::new(Cell::new(0.0));
        let sink = last.clone();
        let id = signal.subscribe(move |v| sink.set(*v));

        signal.set(3.0);
        signal.unsubscribe(id);
        signal.set(4.0);
        signal.unsubscribe(id);
        assert_eq!(last.get(), 3.0);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn clones_share_state() {
        let signal = TimeSignal::new(0.0);
        let view = signal.clone();
        signal.set(7.5);
        assert_eq!(view.get(), 7.5);
    }

    #[test]
    fn listener_may_write_back() {
        let signal = TimeSignal::new(0.0);
        let handle = signal.clone();
        signal.subscribe(move |v| {
            if *v > 10.0 {
                handle.set(10.0);
            }
        });
        signal.set(15.0);
        assert_eq!(signal.get(), 10.0);
    }

    #[test]
    fn listener_may_unsubscribe_itself() {
        let signal = TimeSignal::new(0.0);
        let calls = Rc::new(Cell::new(0));
        let id_slot: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let (handle, counter, slot) = (signal.clone(), calls.clone(), id_slot.clone());
        let id = signal.subscribe(move |_| {
            counter.set(counter.get() + 1);
            if let Some(id) = slot.get() {
                handle.unsubscribe(id);
            }
        });
        id_slot.set(Some(id));

        signal.set(1.0);
        signal.set(2.0);
        assert_eq!(calls.get(), 1);
    }
}
