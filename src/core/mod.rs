//! Declarative building blocks of a machine.
//!
//! This module holds the immutable tables a description is made of:
//! - Named states recognized by predicates over the root value
//! - Message descriptors with opaque, unique ids
//! - Behavior entries with handlers and lifecycle hooks
//!
//! Nothing here holds per-instance state; that lives in [`crate::runtime`].

mod behavior;
mod message;
mod state;

pub use behavior::{Behavior, EnterFn, Hooks, TransitionFn, WILDCARD};
pub use message::{MessageDescriptor, MessageId, MessageInstance, MessageRegistry};
pub use state::{StateDescriptor, StatePredicate, StateRegistry};
