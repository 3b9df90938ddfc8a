//! Construction errors for the staged machine builder.

use thiserror::Error;

/// A single inconsistency between declared states, messages and behaviors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("No states declared. Register at least one state")]
    NoStates,

    #[error("State '{state}' has no behavior entry")]
    MissingBehavior { state: String },

    #[error("Behavior entry '{state}' does not name a declared state")]
    UndeclaredState { state: String },

    #[error("Behavior '{state}' handles undeclared message '{message}'")]
    UnknownMessage { state: String, message: String },

    #[error("State '{name}' is declared more than once")]
    DuplicateState { name: String },

    #[error("Message '{name}' is declared more than once")]
    DuplicateMessage { name: String },

    #[error("Behavior for '{state}' is given more than once")]
    DuplicateBehavior { state: String },

    #[error("Messages '{first}' and '{second}' share one descriptor")]
    SharedDescriptor { first: String, second: String },
}

/// Construction failed; carries every issue found, not just the first.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid machine description: {}", render(.issues))]
pub struct ConfigurationError {
    issues: Vec<ConfigIssue>,
}

impl ConfigurationError {
    pub(crate) fn new(issues: Vec<ConfigIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[ConfigIssue] {
        &self.issues
    }
}

fn render(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
