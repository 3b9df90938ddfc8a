//! Per-state behavior entries and the lifecycle hooks they produce.

use crate::runtime::Machine;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Message name that selects the fallback transition of a behavior.
pub const WILDCARD: &str = "_";

/// Transition from the current value to the next one.
pub type TransitionFn<V, P> = Box<dyn Fn(&Machine<V, P>, &V, P) -> V + Send + Sync>;

/// Entry lifecycle hook: called when a residency in the owning entry begins.
pub type EnterFn<V, P> = Box<dyn Fn(&Machine<V, P>, &V) -> Option<Hooks<V>> + Send + Sync>;

type UpdateFn<V> = Rc<dyn Fn(&V, &V)>;
type ExitFn<V> = Box<dyn FnOnce(&V)>;

/// Handlers and entry hook for one declared state.
///
/// Entries are shared behind an `Arc` and compared by identity: two states
/// registered with the same `Arc<Behavior>` count as one residency.
///
/// # Example
///
/// ```rust
/// use machina::core::{Behavior, Hooks};
///
/// #[derive(Clone, Debug)]
/// enum Player {
///     Idle,
///     Playing { time: u32 },
/// }
///
/// let playing: Behavior<Player, u32> = Behavior::new()
///     .on_enter(|_machine, _value| Hooks::new().on_exit(|_last| {}))
///     .on("seek", |_machine, _value, time| Player::Playing { time })
///     .on("stop", |_machine, _value, _| Player::Idle);
///
/// assert!(playing.handles("seek"));
/// assert!(!playing.handles("pause"));
/// ```
pub struct Behavior<V, P = ()> {
    on_enter: Option<EnterFn<V, P>>,
    handling: HashMap<String, TransitionFn<V, P>>,
    wildcard: Option<TransitionFn<V, P>>,
}

impl<V: 'static, P: 'static> Behavior<V, P> {
    /// An entry with no hook and no handlers. Every message is unhandled.
    pub fn new() -> Self {
        Self {
            on_enter: None,
            handling: HashMap::new(),
            wildcard: None,
        }
    }

    /// Set the entry hook.
    ///
    /// The hook may return [`Hooks`], `Some(hooks)` or `None`.
    pub fn on_enter<F, H>(mut self, hook: F) -> Self
    where
        F: Fn(&Machine<V, P>, &V) -> H + Send + Sync + 'static,
        H: Into<Option<Hooks<V>>>,
    {
        self.on_enter = Some(Box::new(move |machine: &Machine<V, P>, value: &V| {
            hook(machine, value).into()
        }));
        self
    }

    /// Handle `message` with `transition`. Registering [`WILDCARD`] sets the fallback.
    pub fn on<F>(mut self, message: impl Into<String>, transition: F) -> Self
    where
        F: Fn(&Machine<V, P>, &V, P) -> V + Send + Sync + 'static,
    {
        let message = message.into();
        if message == WILDCARD {
            self.wildcard = Some(Box::new(transition));
        } else {
            self.handling.insert(message, Box::new(transition));
        }
        self
    }

    /// Fallback transition for messages without a named handler.
    pub fn otherwise<F>(self, transition: F) -> Self
    where
        F: Fn(&Machine<V, P>, &V, P) -> V + Send + Sync + 'static,
    {
        self.on(WILDCARD, transition)
    }
}

impl<V, P> Behavior<V, P> {
    /// Whether `message` has a named handler or falls back to the wildcard.
    pub fn handles(&self, message: &str) -> bool {
        self.transition(message).is_some()
    }

    pub fn has_wildcard(&self) -> bool {
        self.wildcard.is_some()
    }

    pub(crate) fn transition(&self, message: &str) -> Option<&TransitionFn<V, P>> {
        self.handling.get(message).or(self.wildcard.as_ref())
    }

    pub(crate) fn entry_hook(&self) -> Option<&EnterFn<V, P>> {
        self.on_enter.as_ref()
    }

    /// Names with an explicit handler, wildcard excluded.
    pub(crate) fn message_names(&self) -> impl Iterator<Item = &str> {
        self.handling.keys().map(String::as_str)
    }
}

impl<V: 'static, P: 'static> Default for Behavior<V, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, P> fmt::Debug for Behavior<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handled: Vec<_> = self.message_names().collect();
        handled.sort_unstable();
        f.debug_struct("Behavior")
            .field("on_enter", &self.on_enter.is_some())
            .field("handling", &handled)
            .field("wildcard", &self.wildcard.is_some())
            .finish()
    }
}

/// Hooks installed by an entry hook for the duration of one residency.
///
/// `on_update` runs for every commit that stays in the same entry,
/// `on_exit` runs once when the residency ends. Hooks belong to a single
/// machine instance and need not be `Send`.
pub struct Hooks<V> {
    on_update: Option<UpdateFn<V>>,
    on_exit: Option<ExitFn<V>>,
}

impl<V> Hooks<V> {
    /// An empty hook set.
    pub fn new() -> Self {
        Self {
            on_update: None,
            on_exit: None,
        }
    }

    /// Called with `(previous, next)` on commits within the residency.
    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&V, &V) + 'static,
    {
        self.on_update = Some(Rc::new(hook));
        self
    }

    /// Called with the last value of the residency when it ends.
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&V) + 'static,
    {
        self.on_exit = Some(Box::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_update.is_none() && self.on_exit.is_none()
    }

    pub(crate) fn updater(&self) -> Option<UpdateFn<V>> {
        self.on_update.clone()
    }

    pub(crate) fn into_exit(self) -> Option<ExitFn<V>> {
        self.on_exit
    }
}

impl<V> Default for Hooks<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Hooks<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_update", &self.on_update.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}
