//! Diagnostics emitted by running machines.
//!
//! Machines never print. Unhandled messages and contract violations are
//! handed to a [`DiagnosticSink`]; the default sink forwards to `tracing`.

use crate::runtime::error::DispatchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// What happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No named handler and no wildcard for this state and message.
    Unhandled { state: String, message: String },

    /// A fatal dispatch error was returned to the caller.
    Fault { error: String },
}

/// A diagnostic record for one machine instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub instance: Uuid,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn unhandled(instance: Uuid, state: &str, message: &str) -> Self {
        Self {
            instance,
            at: Utc::now(),
            kind: DiagnosticKind::Unhandled {
                state: state.to_string(),
                message: message.to_string(),
            },
        }
    }

    pub fn fault(instance: Uuid, error: &DispatchError) -> Self {
        Self {
            instance,
            at: Utc::now(),
            kind: DiagnosticKind::Fault {
                error: error.to_string(),
            },
        }
    }
}

/// Destination for machine diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`: unhandled messages as warnings,
/// faults as errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match &diagnostic.kind {
            DiagnosticKind::Unhandled { state, message } => tracing::warn!(
                instance = %diagnostic.instance,
                state = %state,
                on = %message,
                "Message not handled in current state"
            ),
            DiagnosticKind::Fault { error } => tracing::error!(
                instance = %diagnostic.instance,
                error = %error,
                "Machine contract violated"
            ),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics so far, oldest first.
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(state, message)` pairs of every unhandled-message diagnostic.
    pub fn unhandled(&self) -> Vec<(String, String)> {
        self.records()
            .into_iter()
            .filter_map(|record| match record.kind {
                DiagnosticKind::Unhandled { state, message } => Some((state, message)),
                DiagnosticKind::Fault { .. } => None,
            })
            .collect()
    }

    /// Rendered errors of every fault diagnostic.
    pub fn faults(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|record| match record.kind {
                DiagnosticKind::Fault { error } => Some(error),
                DiagnosticKind::Unhandled { .. } => None,
            })
            .collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}
