//! Staged builder for machine descriptions.
//!
//! Each stage is a distinct type, so a chain that stops before
//! [`MessagesDeclared::behaviors`] has nothing to instantiate.

use crate::builder::error::ConfigurationError;
use crate::core::{Behavior, MessageRegistry, StateRegistry};
use crate::runtime::Description;
use std::fmt;
use std::sync::Arc;

/// Entry point of the builder chain.
///
/// # Example
///
/// ```rust
/// use machina::builder::StateMachineBuilder;
/// use machina::core::{Behavior, MessageRegistry};
/// use machina::states;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Light {
///     Red,
///     Green,
/// }
///
/// let description = StateMachineBuilder::new()
///     .states(states!(Light {
///         "red" => Light::Red,
///         "green" => Light::Green,
///     }))
///     .with_initial_state(|_: ()| Light::Red)
///     .messages(MessageRegistry::new().declare("next"))
///     .behaviors([
///         ("red", Behavior::<Light, ()>::new().on("next", |_, _, _| Light::Green)),
///         ("green", Behavior::new().on("next", |_, _, _| Light::Red)),
///     ])
///     .unwrap();
///
/// let light = description.instantiate(()).unwrap();
/// light.send("next", ()).unwrap();
/// assert_eq!(light.value(), Light::Green);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct StateMachineBuilder;

impl StateMachineBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Stage 1: declare the states.
    pub fn states<V>(self, states: StateRegistry<V>) -> StatesDeclared<V> {
        StatesDeclared { states }
    }
}

/// States are known; the initial value factory is next.
pub struct StatesDeclared<V> {
    states: StateRegistry<V>,
}

impl<V: 'static> StatesDeclared<V> {
    /// Stage 2: how a new instance computes its first value.
    pub fn with_initial_state<I, F>(self, factory: F) -> InitialDeclared<V, I>
    where
        I: 'static,
        F: Fn(I) -> V + Send + Sync + 'static,
    {
        InitialDeclared {
            states: self.states,
            factory: Arc::new(factory),
        }
    }
}

/// States and factory are known; messages are next.
pub struct InitialDeclared<V, I> {
    states: StateRegistry<V>,
    factory: Arc<dyn Fn(I) -> V + Send + Sync>,
}

impl<V, I> InitialDeclared<V, I> {
    /// Stage 3: declare the messages.
    pub fn messages(self, messages: MessageRegistry) -> MessagesDeclared<V, I> {
        MessagesDeclared {
            states: self.states,
            factory: self.factory,
            messages,
        }
    }
}

/// Everything but the behavior table is known.
pub struct MessagesDeclared<V, I> {
    states: StateRegistry<V>,
    factory: Arc<dyn Fn(I) -> V + Send + Sync>,
    messages: MessageRegistry,
}

impl<V, I> MessagesDeclared<V, I>
where
    V: Clone + fmt::Debug + 'static,
{
    /// Messages declared in stage 3, for building behaviors that refer to them.
    pub fn declared_messages(&self) -> &MessageRegistry {
        &self.messages
    }

    /// Stage 4: one behavior entry per declared state.
    ///
    /// Fails with every inconsistency found: states without an entry,
    /// entries for undeclared states, handlers for undeclared messages and
    /// duplicate declarations.
    pub fn behaviors<P, N, B>(
        self,
        behaviors: impl IntoIterator<Item = (N, B)>,
    ) -> Result<Description<V, I, P>, ConfigurationError>
    where
        P: 'static,
        N: Into<String>,
        B: Into<Arc<Behavior<V, P>>>,
    {
        let behaviors = behaviors
            .into_iter()
            .map(|(name, behavior)| (name.into(), behavior.into()))
            .collect();
        let description = Description::new(self.states, self.factory, self.messages, behaviors);
        if let Err(error) = &description {
            tracing::error!(error = %error, "Rejected machine description");
        }
        description
    }
}
