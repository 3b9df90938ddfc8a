//! State registry: logical state names mapped to membership predicates.
//!
//! A state is not a variant of a dedicated enum but a named predicate over
//! the machine's root value type. Whatever value a transition produces is
//! classified by asking each registered predicate in declaration order.

use std::fmt;

/// Membership predicate for one declared state.
pub type StatePredicate<V> = Box<dyn Fn(&V) -> bool + Send + Sync>;

/// A named state and the predicate that recognizes its values.
///
/// Descriptors are registered once and never change afterwards.
pub struct StateDescriptor<V> {
    name: String,
    predicate: StatePredicate<V>,
}

impl<V> StateDescriptor<V> {
    /// Create a descriptor from a name and a pure predicate.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether `value` belongs to this state.
    pub fn accepts(&self, value: &V) -> bool {
        (self.predicate)(value)
    }
}

impl<V> fmt::Debug for StateDescriptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of declared states.
///
/// Predicates are expected to be mutually exclusive. That is the caller's
/// responsibility: when two predicates accept the same value, the one
/// registered first wins.
///
/// # Example
///
/// ```rust
/// use machina::core::StateRegistry;
///
/// #[derive(Clone, Debug)]
/// enum Light {
///     Red,
///     Green,
/// }
///
/// let states = StateRegistry::new()
///     .register("red", |l: &Light| matches!(l, Light::Red))
///     .register("green", |l: &Light| matches!(l, Light::Green));
///
/// assert_eq!(states.resolve(&Light::Green), Some("green"));
/// ```
pub struct StateRegistry<V> {
    states: Vec<StateDescriptor<V>>,
}

impl<V> StateRegistry<V> {
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Add a state. Registration order is resolution order.
    pub fn register<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        self.states.push(StateDescriptor::new(name, predicate));
        self
    }

    /// Name of the first state whose predicate accepts `value`.
    pub fn resolve(&self, value: &V) -> Option<&str> {
        self.position(value).map(|index| self.states[index].name())
    }

    /// Index of the first state whose predicate accepts `value`.
    pub(crate) fn position(&self, value: &V) -> Option<usize> {
        self.states.iter().position(|state| state.accepts(value))
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|state| state.name() == name)
    }

    pub(crate) fn name(&self, index: usize) -> &str {
        self.states[index].name()
    }

    /// Declared state names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(StateDescriptor::name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<V> Default for StateRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for StateRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
