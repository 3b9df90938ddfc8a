//! Errors raised while a machine is running.

use crate::core::MessageId;
use thiserror::Error;

/// Fatal dispatch-time failures.
///
/// Each variant signals a mismatch between the declared state/message graph
/// and a runtime value. The current `send` is aborted and nothing is
/// committed; the machine keeps its previous value and hooks.
///
/// An unhandled message is not an error: it is reported as a diagnostic and
/// the call returns `Ok(())`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Value {value} matches no declared state")]
    UnknownState { value: String },

    #[error("Transition from '{state}' on '{message}' produced {value}, which matches no declared state")]
    UnknownTargetState {
        state: String,
        message: String,
        value: String,
    },

    #[error("Message {id} is not declared by this machine")]
    UnknownMessage { id: MessageId },

    #[error("No message named '{name}' is declared")]
    UndeclaredMessage { name: String },

    #[error("Machine has already been dropped")]
    Dropped,
}
