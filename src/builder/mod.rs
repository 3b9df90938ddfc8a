//! Builder API for declaring machines.
//!
//! The chain runs states → initial value → messages → behaviors and ends in
//! a validated [`Description`](crate::runtime::Description):
//!
//! ```text
//! StateMachineBuilder::new()
//!     .states(..)               // StatesDeclared
//!     .with_initial_state(..)   // InitialDeclared
//!     .messages(..)             // MessagesDeclared
//!     .behaviors(..)            // Result<Description, ConfigurationError>
//! ```

pub mod error;
pub mod machine;
pub mod macros;
pub(crate) mod validation;

pub use error::{ConfigIssue, ConfigurationError};
pub use machine::{InitialDeclared, MessagesDeclared, StateMachineBuilder, StatesDeclared};

use crate::runtime::Machine;

/// Transition that ignores its input and always produces `target`.
///
/// # Example
///
/// ```
/// use machina::builder::goto;
/// use machina::core::Behavior;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// let open: Behavior<Door> = Behavior::new().on("close", goto(Door::Closed));
/// assert!(open.handles("close"));
/// ```
pub fn goto<V, P>(target: V) -> impl Fn(&Machine<V, P>, &V, P) -> V + Send + Sync + 'static
where
    V: Clone + Send + Sync + 'static,
    P: 'static,
{
    move |_: &Machine<V, P>, _: &V, _: P| target.clone()
}

/// Transition that keeps the current value, continuing the residency.
pub fn stay<V, P>() -> impl Fn(&Machine<V, P>, &V, P) -> V + Send + Sync + 'static
where
    V: Clone + 'static,
    P: 'static,
{
    |_: &Machine<V, P>, current: &V, _: P| current.clone()
}
