//! Running machines.
//!
//! This is the imperative shell around the declarative tables in
//! [`crate::core`]:
//!
//! - **Description**: validated tables plus the initial-value factory
//! - **Machine**: one instance with a private value and hook set
//! - **Dispatch**: resolve state, pick a handler, commit, fire hooks
//! - **Diagnostics**: unhandled messages and faults, sent to a sink
//!
//! # Dispatch
//!
//! For every `send`:
//!
//! 1. The current value is resolved to a state; failure is fatal.
//! 2. The message id is resolved to a declared name; failure is fatal.
//! 3. The state's entry picks the named handler or its wildcard. With
//!    neither, an unhandled diagnostic is emitted and nothing changes.
//! 4. The transition's result is resolved to a state; failure is fatal.
//! 5. The result is committed and published to any observer.
//! 6. If the new entry is the same `Arc` as the old, `on_update` fires.
//!    Otherwise `on_exit` fires, then the new entry's `on_enter`.
//!
//! A send made by an observer or an exit hook can commit before step 6 has
//! finished. That commit first runs whatever exit and entry hooks are still
//! owed, so every residency still sees one `on_enter`, then `on_update`
//! for each later commit.

mod description;
mod diagnostics;
mod error;
mod machine;

pub use description::Description;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, RecordingSink, TracingSink};
pub use error::DispatchError;
pub use machine::{Machine, Sender, WeakMachine};
