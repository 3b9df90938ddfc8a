//! Observable adapter: per-instance broadcast of committed values.
//!
//! Each instance stamped from an [`ObservableDescription`] owns a private
//! [`Observer`]. Every committed value, starting with the initial one, is
//! pushed to the listeners attached to that observer and to no other. The
//! adapter only observes; it never changes dispatch or hook firing.

use crate::runtime::{Description, DispatchError, Machine};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};
use std::sync::Arc;

type Listener<V> = Rc<dyn Fn(&V)>;

struct Channel<V> {
    latest: RefCell<Option<V>>,
    listeners: RefCell<Vec<(u64, Listener<V>)>>,
    next_id: Cell<u64>,
}

impl<V> Channel<V> {
    fn is_attached(&self, id: u64) -> bool {
        self.listeners.borrow().iter().any(|(attached, _)| *attached == id)
    }

    fn detach(&self, id: u64) {
        self.listeners.borrow_mut().retain(|(attached, _)| *attached != id);
    }
}

/// Multicast point owned by one machine instance.
///
/// A listener is called with the latest committed value as soon as it
/// subscribes, then with every later commit in order.
pub struct Observer<V> {
    channel: Rc<Channel<V>>,
}

impl<V: Clone + 'static> Observer<V> {
    pub(crate) fn new() -> Self {
        Self {
            channel: Rc::new(Channel {
                latest: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Attach `listener`. Dropping the returned guard detaches it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription<V>
    where
        F: Fn(&V) + 'static,
    {
        let id = self.channel.next_id.get();
        self.channel.next_id.set(id + 1);

        let listener: Listener<V> = Rc::new(listener);
        self.channel
            .listeners
            .borrow_mut()
            .push((id, Rc::clone(&listener)));

        let latest = self.channel.latest.borrow().clone();
        if let Some(value) = latest {
            listener(&value);
        }

        Subscription {
            id,
            channel: Rc::downgrade(&self.channel),
        }
    }

    /// Latest committed value, if any commit has happened yet.
    pub fn latest(&self) -> Option<V> {
        self.channel.latest.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.channel.listeners.borrow().len()
    }

    pub(crate) fn publish(&self, value: &V) {
        *self.channel.latest.borrow_mut() = Some(value.clone());

        // Listeners may attach or detach while we deliver.
        let snapshot: Vec<(u64, Listener<V>)> = self
            .channel
            .listeners
            .borrow()
            .iter()
            .map(|(id, listener)| (*id, Rc::clone(listener)))
            .collect();
        for (id, listener) in snapshot {
            if self.channel.is_attached(id) {
                listener(value);
            }
        }
    }
}

impl<V> Clone for Observer<V> {
    fn clone(&self) -> Self {
        Self {
            channel: Rc::clone(&self.channel),
        }
    }
}

impl<V> fmt::Debug for Observer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("listeners", &self.channel.listeners.borrow().len())
            .finish()
    }
}

/// Guard for one attached listener.
#[must_use = "dropping a Subscription detaches its listener"]
pub struct Subscription<V> {
    id: u64,
    channel: Weak<Channel<V>>,
}

impl<V> Subscription<V> {
    /// Detach the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener attached for as long as the observer lives.
    pub fn persist(self) {
        std::mem::forget(self);
    }
}

impl<V> Drop for Subscription<V> {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.detach(self.id);
        }
    }
}

/// A description whose instances each carry a private [`Observer`].
pub struct ObservableDescription<V, I, P, R> {
    description: Description<V, I, P>,
    adapter: Arc<dyn Fn(Observer<V>) -> R + Send + Sync>,
}

impl<V, I, P, R> ObservableDescription<V, I, P, R>
where
    V: Clone + fmt::Debug + 'static,
    P: 'static,
{
    pub(crate) fn new(
        description: Description<V, I, P>,
        adapter: Arc<dyn Fn(Observer<V>) -> R + Send + Sync>,
    ) -> Self {
        Self {
            description,
            adapter,
        }
    }

    /// Stamp a new machine with its own observer.
    ///
    /// The adapter runs before the initial value is committed, so anything
    /// it subscribes sees that value.
    pub fn instantiate(&self, input: I) -> Result<ObservableMachine<V, P, R>, DispatchError> {
        let observer = Observer::new();
        let observable = (self.adapter)(observer.clone());
        let machine = self.description.start(input, Some(observer))?;
        Ok(ObservableMachine {
            machine,
            observable,
        })
    }

    pub fn description(&self) -> &Description<V, I, P> {
        &self.description
    }
}

impl<V, I, P, R> Clone for ObservableDescription<V, I, P, R> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            adapter: Arc::clone(&self.adapter),
        }
    }
}

/// A machine plus whatever its observable adapter produced.
pub struct ObservableMachine<V, P, R> {
    machine: Machine<V, P>,
    observable: R,
}

impl<V, P, R> ObservableMachine<V, P, R> {
    /// The adapter's result for this instance.
    pub fn as_observable(&self) -> &R {
        &self.observable
    }

    pub fn machine(&self) -> &Machine<V, P> {
        &self.machine
    }

    pub fn into_parts(self) -> (Machine<V, P>, R) {
        (self.machine, self.observable)
    }
}

impl<V, P, R> Deref for ObservableMachine<V, P, R> {
    type Target = Machine<V, P>;

    fn deref(&self) -> &Self::Target {
        &self.machine
    }
}
