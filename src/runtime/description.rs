//! Validated, immutable machine descriptions.

use crate::builder::validation::validate;
use crate::builder::ConfigurationError;
use crate::core::{Behavior, MessageDescriptor, MessageId, MessageRegistry, StateRegistry};
use crate::observable::{ObservableDescription, Observer};
use crate::runtime::diagnostics::{DiagnosticSink, TracingSink};
use crate::runtime::error::DispatchError;
use crate::runtime::machine::Machine;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub(crate) type Factory<I, V> = Arc<dyn Fn(I) -> V + Send + Sync>;

/// Lookup tables shared read-only by every instance of one description.
pub(crate) struct Tables<V, P> {
    states: StateRegistry<V>,
    /// Behavior entry per state, indexed like `states`.
    entries: Vec<Arc<Behavior<V, P>>>,
    messages: MessageRegistry,
    /// Reverse map from descriptor id to position in `messages`.
    message_index: HashMap<MessageId, usize>,
}

impl<V, P> Tables<V, P> {
    pub(crate) fn resolve(&self, value: &V) -> Option<usize> {
        self.states.position(value)
    }

    pub(crate) fn state_name(&self, state: usize) -> &str {
        self.states.name(state)
    }

    pub(crate) fn entry(&self, state: usize) -> &Arc<Behavior<V, P>> {
        &self.entries[state]
    }

    pub(crate) fn message_name(&self, id: MessageId) -> Option<&str> {
        self.message_index
            .get(&id)
            .map(|&index| self.messages.name(index))
    }

    pub(crate) fn descriptor(&self, name: &str) -> Option<MessageDescriptor> {
        self.messages.get(name)
    }
}

/// A fully validated machine declaration.
///
/// Every declared state has a behavior entry and every handler names a
/// declared message. Instances stamped with [`Description::instantiate`]
/// share these tables and own nothing else in common.
pub struct Description<V, I, P = ()> {
    tables: Arc<Tables<V, P>>,
    factory: Factory<I, V>,
    sink: Arc<dyn DiagnosticSink>,
}

impl<V, I, P> Description<V, I, P>
where
    V: Clone + fmt::Debug + 'static,
    P: 'static,
{
    pub(crate) fn new(
        states: StateRegistry<V>,
        factory: Factory<I, V>,
        messages: MessageRegistry,
        behaviors: Vec<(String, Arc<Behavior<V, P>>)>,
    ) -> Result<Self, ConfigurationError> {
        validate(&states, &messages, &behaviors)?;

        let by_name: HashMap<&str, &Arc<Behavior<V, P>>> = behaviors
            .iter()
            .map(|(name, behavior)| (name.as_str(), behavior))
            .collect();
        // Validation guarantees every state has an entry.
        let entries = states
            .names()
            .filter_map(|name| by_name.get(name).map(|behavior| Arc::clone(behavior)))
            .collect();
        let message_index = messages
            .entries()
            .iter()
            .enumerate()
            .map(|(index, (_, descriptor))| (descriptor.id(), index))
            .collect();

        Ok(Self {
            tables: Arc::new(Tables {
                states,
                entries,
                messages,
                message_index,
            }),
            factory,
            sink: Arc::new(TracingSink),
        })
    }

    /// Replace the diagnostics sink used by instances created afterwards.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Stamp a new, independent machine.
    ///
    /// Fails with [`DispatchError::UnknownState`] if the factory produces a
    /// value no declared state accepts.
    pub fn instantiate(&self, input: I) -> Result<Machine<V, P>, DispatchError> {
        self.start(input, None)
    }

    /// Attach an observable adapter. `adapter` receives each new instance's
    /// private [`Observer`] and its result is handed back verbatim.
    pub fn observable<R, F>(self, adapter: F) -> ObservableDescription<V, I, P, R>
    where
        F: Fn(Observer<V>) -> R + Send + Sync + 'static,
    {
        ObservableDescription::new(self, Arc::new(adapter))
    }

    pub(crate) fn start(
        &self,
        input: I,
        observer: Option<Observer<V>>,
    ) -> Result<Machine<V, P>, DispatchError> {
        let initial = (self.factory)(input);
        Machine::start(
            Arc::clone(&self.tables),
            Arc::clone(&self.sink),
            observer,
            initial,
        )
    }
}

impl<V, I, P> Description<V, I, P> {
    pub fn states(&self) -> &StateRegistry<V> {
        &self.tables.states
    }

    pub fn messages(&self) -> &MessageRegistry {
        &self.tables.messages
    }

    /// Descriptor declared under `name`.
    pub fn message(&self, name: &str) -> Option<MessageDescriptor> {
        self.tables.descriptor(name)
    }

    /// Behavior entry of the state named `state`.
    pub fn behavior(&self, state: &str) -> Option<&Arc<Behavior<V, P>>> {
        self.tables
            .states
            .index_of(state)
            .map(|index| self.tables.entry(index))
    }
}

impl<V, I, P> Clone for Description<V, I, P> {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            factory: Arc::clone(&self.factory),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<V, I, P> fmt::Debug for Description<V, I, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Description")
            .field("states", &self.tables.states)
            .field("messages", &self.tables.messages)
            .finish_non_exhaustive()
    }
}
