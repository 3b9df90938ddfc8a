//! Running machine instances and the dispatch algorithm.
//!
//! A [`Machine`] is a cheap, cloneable handle to one instance. All work for
//! a `send` runs to completion on the calling thread; there is no queue.
//! Transitions and hooks receive the handle and may call `send` again
//! synchronously. Such nested calls finish, hooks included, before control
//! returns to whoever issued them. No internal borrow is held while user
//! code runs.
//!
//! Machines are `!Send`. Callers that need to reach an instance from
//! elsewhere keep a [`WeakMachine`] on the same thread (for example inside
//! a `tokio::task::LocalSet`).

use crate::core::{Behavior, Hooks, MessageDescriptor, MessageId, MessageInstance};
use crate::observable::Observer;
use crate::runtime::description::Tables;
use crate::runtime::diagnostics::{Diagnostic, DiagnosticSink};
use crate::runtime::error::DispatchError;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use uuid::Uuid;

/// Mutable part of an instance.
struct Slot<V, P> {
    value: V,
    entry: Arc<Behavior<V, P>>,
    hooks: Hooks<V>,
    /// Bumped whenever the current behavior entry changes.
    residency: u64,
    /// Exit hook of the residency that just ended, with its last value.
    pending_exit: Option<(Box<dyn FnOnce(&V)>, V)>,
    /// The current residency's entry hook has not started yet.
    pending_enter: bool,
}

struct Inner<V, P> {
    id: Uuid,
    tables: Arc<Tables<V, P>>,
    sink: Arc<dyn DiagnosticSink>,
    observer: Option<Observer<V>>,
    slot: RefCell<Slot<V, P>>,
}

/// One running machine.
pub struct Machine<V, P = ()> {
    inner: Rc<Inner<V, P>>,
}

impl<V, P> Machine<V, P>
where
    V: Clone + fmt::Debug + 'static,
    P: 'static,
{
    pub(crate) fn start(
        tables: Arc<Tables<V, P>>,
        sink: Arc<dyn DiagnosticSink>,
        observer: Option<Observer<V>>,
        initial: V,
    ) -> Result<Self, DispatchError> {
        let id = Uuid::new_v4();
        let Some(state) = tables.resolve(&initial) else {
            let error = DispatchError::UnknownState {
                value: format!("{initial:?}"),
            };
            sink.emit(Diagnostic::fault(id, &error));
            return Err(error);
        };

        let entry = Arc::clone(tables.entry(state));
        tracing::debug!(instance = %id, state = tables.state_name(state), "Machine started");
        let machine = Self {
            inner: Rc::new(Inner {
                id,
                tables,
                sink,
                observer,
                slot: RefCell::new(Slot {
                    value: initial.clone(),
                    entry,
                    hooks: Hooks::new(),
                    residency: 0,
                    pending_exit: None,
                    pending_enter: true,
                }),
            }),
        };

        machine.publish(&initial);
        machine.settle();
        Ok(machine)
    }

    /// Send the message declared under `message`.
    pub fn send(&self, message: &str, payload: P) -> Result<(), DispatchError> {
        let descriptor = self.descriptor(message).map_err(|error| self.fault(error))?;
        self.deliver(descriptor.id(), payload)
    }

    /// Send a message instance stamped by a descriptor.
    ///
    /// Fails with [`DispatchError::UnknownMessage`] if the descriptor was not
    /// declared by this machine's description.
    pub fn dispatch(&self, message: MessageInstance<P>) -> Result<(), DispatchError> {
        let id = message.id();
        self.deliver(id, message.into_payload())
    }

    /// Callable bound to one declared message.
    ///
    /// A failed lookup is returned to the caller but not reported to the
    /// diagnostics sink; nothing was sent.
    pub fn sender(&self, message: &str) -> Result<Sender<V, P>, DispatchError> {
        let descriptor = self.descriptor(message)?;
        Ok(Sender {
            machine: self.clone(),
            descriptor,
        })
    }

    /// Current value.
    pub fn value(&self) -> V {
        self.inner.slot.borrow().value.clone()
    }

    /// Name of the state the current value belongs to.
    pub fn state(&self) -> Option<&str> {
        let tables = &self.inner.tables;
        let state = tables.resolve(&self.inner.slot.borrow().value)?;
        Some(tables.state_name(state))
    }

    fn descriptor(&self, message: &str) -> Result<MessageDescriptor, DispatchError> {
        self.inner
            .tables
            .descriptor(message)
            .ok_or_else(|| DispatchError::UndeclaredMessage {
                name: message.to_string(),
            })
    }

    fn fault(&self, error: DispatchError) -> DispatchError {
        self.inner.sink.emit(Diagnostic::fault(self.inner.id, &error));
        error
    }

    fn deliver(&self, id: MessageId, payload: P) -> Result<(), DispatchError> {
        let tables = Arc::clone(&self.inner.tables);
        let current = self.value();

        let state = tables.resolve(&current).ok_or_else(|| {
            self.fault(DispatchError::UnknownState {
                value: format!("{current:?}"),
            })
        })?;
        let entry = tables.entry(state);
        let message = tables
            .message_name(id)
            .ok_or_else(|| self.fault(DispatchError::UnknownMessage { id }))?;
        let state_name = tables.state_name(state);

        let Some(transition) = entry.transition(message) else {
            self.inner
                .sink
                .emit(Diagnostic::unhandled(self.inner.id, state_name, message));
            return Ok(());
        };

        let next = transition(self, &current, payload);
        let Some(next_state) = tables.resolve(&next) else {
            return Err(self.fault(DispatchError::UnknownTargetState {
                state: state_name.to_string(),
                message: message.to_string(),
                value: format!("{next:?}"),
            }));
        };

        tracing::trace!(
            instance = %self.inner.id,
            from = state_name,
            on = message,
            to = tables.state_name(next_state),
            "Committing transition"
        );
        self.commit(next, tables.entry(next_state));
        Ok(())
    }

    /// Store `next` unconditionally, publish it, then fire hooks by entry
    /// identity.
    ///
    /// The comparison is against whatever is current at commit time, which
    /// includes commits made by nested sends inside the transition. Hook
    /// work left over from an earlier commit is settled first, so a commit
    /// never lands in a residency whose `on_enter` has not run.
    fn commit(&self, next: V, entry: &Arc<Behavior<V, P>>) {
        self.settle();

        let update = {
            let mut slot = self.inner.slot.borrow_mut();
            let previous = std::mem::replace(&mut slot.value, next.clone());
            if Arc::ptr_eq(&slot.entry, entry) {
                slot.hooks.updater().map(|update| (update, previous))
            } else {
                slot.entry = Arc::clone(entry);
                slot.residency += 1;
                slot.pending_exit = std::mem::take(&mut slot.hooks)
                    .into_exit()
                    .map(|exit| (exit, previous));
                slot.pending_enter = true;
                tracing::debug!(
                    instance = %self.inner.id,
                    residency = slot.residency,
                    "Residency changed"
                );
                None
            }
        };

        self.publish(&next);

        if let Some((update, previous)) = update {
            update(&previous, &next);
        }
        self.settle();
    }

    /// Run the pending exit hook, then the pending entry hook.
    ///
    /// Either may send; a nested commit settles whatever is still pending
    /// before it lands.
    fn settle(&self) {
        let exit = self.inner.slot.borrow_mut().pending_exit.take();
        if let Some((exit, previous)) = exit {
            exit(&previous);
        }

        let (entry, value, residency) = {
            let mut slot = self.inner.slot.borrow_mut();
            if !slot.pending_enter {
                return;
            }
            slot.pending_enter = false;
            (Arc::clone(&slot.entry), slot.value.clone(), slot.residency)
        };
        self.enter(&entry, &value, residency);
    }

    /// Run the entry hook of `entry` and install the hooks it returns.
    fn enter(&self, entry: &Behavior<V, P>, value: &V, residency: u64) {
        let Some(hook) = entry.entry_hook() else {
            return;
        };
        let hooks = hook(self, value).unwrap_or_default();

        if self.current_residency() == residency {
            self.inner.slot.borrow_mut().hooks = hooks;
            return;
        }

        // A nested send inside the entry hook already ended this residency.
        tracing::debug!(
            instance = %self.inner.id,
            "Residency ended before its hooks were installed"
        );
        if let Some(exit) = hooks.into_exit() {
            exit(value);
        }
    }

    fn current_residency(&self) -> u64 {
        self.inner.slot.borrow().residency
    }

    fn publish(&self, value: &V) {
        if let Some(observer) = &self.inner.observer {
            observer.publish(value);
        }
    }
}

impl<V, P> Machine<V, P> {
    /// Identifier carried by this instance's diagnostics.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Non-owning handle, for hooks and deferred work.
    pub fn downgrade(&self) -> WeakMachine<V, P> {
        WeakMachine {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<V, P> Clone for Machine<V, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: fmt::Debug, P> fmt::Debug for Machine<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Machine");
        debug.field("id", &self.inner.id);
        match self.inner.slot.try_borrow() {
            Ok(slot) => debug.field("value", &slot.value),
            Err(_) => debug.field("value", &"<dispatching>"),
        };
        debug.finish()
    }
}

/// A machine handle bound to one declared message.
pub struct Sender<V, P = ()> {
    machine: Machine<V, P>,
    descriptor: MessageDescriptor,
}

impl<V, P> Sender<V, P>
where
    V: Clone + fmt::Debug + 'static,
    P: 'static,
{
    pub fn send(&self, payload: P) -> Result<(), DispatchError> {
        self.machine.dispatch(self.descriptor.stamp(payload))
    }

    pub fn descriptor(&self) -> MessageDescriptor {
        self.descriptor
    }
}

impl<V, P> Clone for Sender<V, P> {
    fn clone(&self) -> Self {
        Self {
            machine: self.machine.clone(),
            descriptor: self.descriptor,
        }
    }
}

/// Non-owning machine handle.
///
/// Hooks that capture a strong [`Machine`] keep their own instance alive;
/// capture one of these instead.
pub struct WeakMachine<V, P = ()> {
    inner: Weak<Inner<V, P>>,
}

impl<V, P> WeakMachine<V, P> {
    pub fn upgrade(&self) -> Option<Machine<V, P>> {
        self.inner.upgrade().map(|inner| Machine { inner })
    }
}

impl<V, P> WeakMachine<V, P>
where
    V: Clone + fmt::Debug + 'static,
    P: 'static,
{
    /// Send if the machine is still alive, [`DispatchError::Dropped`] otherwise.
    pub fn send(&self, message: &str, payload: P) -> Result<(), DispatchError> {
        self.upgrade()
            .ok_or(DispatchError::Dropped)?
            .send(message, payload)
    }
}

impl<V, P> Clone for WeakMachine<V, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}
