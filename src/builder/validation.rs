//! Completeness checks run once when a description is built.
//!
//! Checks are accumulated with `Validation` so a caller sees every
//! inconsistency in one pass instead of fixing them one at a time.

use crate::builder::error::{ConfigIssue, ConfigurationError};
use crate::core::{Behavior, MessageRegistry, StateRegistry};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigIssue>>;

fn require(ok: bool, issue: impl FnOnce() -> ConfigIssue) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(issue())
    }
}

/// Names that appear more than once, each reported once, in first-seen order.
fn repeated<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut repeated = Vec::new();
    for name in names {
        if !seen.insert(name) && reported.insert(name) {
            repeated.push(name.to_string());
        }
    }
    repeated
}

pub(crate) fn validate<V, P>(
    states: &StateRegistry<V>,
    messages: &MessageRegistry,
    behaviors: &[(String, Arc<Behavior<V, P>>)],
) -> Result<(), ConfigurationError> {
    let mut checks: Vec<Check> = Vec::new();

    checks.push(require(!states.is_empty(), || ConfigIssue::NoStates));

    for name in repeated(states.names()) {
        checks.push(Validation::fail(ConfigIssue::DuplicateState { name }));
    }
    for name in repeated(messages.names()) {
        checks.push(Validation::fail(ConfigIssue::DuplicateMessage { name }));
    }
    for state in repeated(behaviors.iter().map(|(name, _)| name.as_str())) {
        checks.push(Validation::fail(ConfigIssue::DuplicateBehavior { state }));
    }

    // One descriptor under two names would make id -> name ambiguous.
    let mut owners = HashMap::new();
    for (name, descriptor) in messages.entries() {
        if let Some(first) = owners.insert(descriptor.id(), name.as_str()) {
            checks.push(Validation::fail(ConfigIssue::SharedDescriptor {
                first: first.to_string(),
                second: name.clone(),
            }));
        }
    }

    let covered: HashSet<&str> = behaviors.iter().map(|(name, _)| name.as_str()).collect();
    for state in states.names() {
        checks.push(require(covered.contains(state), || {
            ConfigIssue::MissingBehavior {
                state: state.to_string(),
            }
        }));
    }

    let declared: HashSet<&str> = states.names().collect();
    let known: HashSet<&str> = messages.names().collect();
    for (state, behavior) in behaviors {
        checks.push(require(declared.contains(state.as_str()), || {
            ConfigIssue::UndeclaredState {
                state: state.clone(),
            }
        }));

        let mut handled: Vec<&str> = behavior.message_names().collect();
        handled.sort_unstable();
        for message in handled {
            checks.push(require(known.contains(message), || {
                ConfigIssue::UnknownMessage {
                    state: state.clone(),
                    message: message.to_string(),
                }
            }));
        }
    }

    match Validation::all_vec(checks) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(issues) => Err(ConfigurationError::new(
            issues.iter().cloned().collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MessageDescriptor;

    #[derive(Clone, PartialEq, Debug)]
    enum Light {
        Red,
        Yellow,
        Green,
    }

    fn light_states() -> StateRegistry<Light> {
        StateRegistry::new()
            .register("red", |l: &Light| matches!(l, Light::Red))
            .register("yellow", |l: &Light| matches!(l, Light::Yellow))
            .register("green", |l: &Light| matches!(l, Light::Green))
    }

    fn entry(behavior: Behavior<Light>) -> Arc<Behavior<Light>> {
        Arc::new(behavior)
    }

    #[test]
    fn complete_table_passes() {
        let messages = MessageRegistry::new().declare("next");
        let behaviors = vec![
            ("red".to_string(), entry(Behavior::new().on("next", |_, _, _| Light::Green))),
            ("yellow".to_string(), entry(Behavior::new())),
            ("green".to_string(), entry(Behavior::new().otherwise(|_, _, _| Light::Yellow))),
        ];

        assert!(validate(&light_states(), &messages, &behaviors).is_ok());
    }

    #[test]
    fn missing_entry_is_reported() {
        let messages = MessageRegistry::new().declare("next");
        let behaviors = vec![
            ("red".to_string(), entry(Behavior::new())),
            ("green".to_string(), entry(Behavior::new())),
        ];

        let error = validate(&light_states(), &messages, &behaviors).unwrap_err();

        assert_eq!(
            error.issues(),
            &[ConfigIssue::MissingBehavior {
                state: "yellow".to_string()
            }]
        );
    }

    #[test]
    fn all_issues_are_accumulated() {
        let messages = MessageRegistry::new().declare("next");
        let behaviors = vec![
            ("red".to_string(), entry(Behavior::new().on("stop", |_, _, _| Light::Red))),
            ("blue".to_string(), entry(Behavior::new())),
        ];

        let error = validate(&light_states(), &messages, &behaviors).unwrap_err();
        let issues = error.issues();

        assert_eq!(issues.len(), 4);
        assert!(issues.contains(&ConfigIssue::MissingBehavior {
            state: "yellow".to_string()
        }));
        assert!(issues.contains(&ConfigIssue::MissingBehavior {
            state: "green".to_string()
        }));
        assert!(issues.contains(&ConfigIssue::UndeclaredState {
            state: "blue".to_string()
        }));
        assert!(issues.contains(&ConfigIssue::UnknownMessage {
            state: "red".to_string(),
            message: "stop".to_string()
        }));
    }

    #[test]
    fn empty_state_registry_is_rejected() {
        let behaviors: Vec<(String, Arc<Behavior<Light>>)> = Vec::new();

        let error = validate(&StateRegistry::new(), &MessageRegistry::new(), &behaviors)
            .unwrap_err();

        assert_eq!(error.issues(), &[ConfigIssue::NoStates]);
    }

    #[test]
    fn duplicates_are_reported_once() {
        let states = light_states().register("red", |_: &Light| false);
        let shared = MessageDescriptor::create();
        let messages = MessageRegistry::new()
            .insert("next", shared)
            .insert("advance", shared)
            .declare("next");
        let behaviors = vec![
            ("red".to_string(), entry(Behavior::new())),
            ("red".to_string(), entry(Behavior::new())),
            ("yellow".to_string(), entry(Behavior::new())),
            ("green".to_string(), entry(Behavior::new())),
        ];

        let error = validate(&states, &messages, &behaviors).unwrap_err();
        let issues = error.issues();

        assert!(issues.contains(&ConfigIssue::DuplicateState {
            name: "red".to_string()
        }));
        assert!(issues.contains(&ConfigIssue::DuplicateMessage {
            name: "next".to_string()
        }));
        assert!(issues.contains(&ConfigIssue::DuplicateBehavior {
            state: "red".to_string()
        }));
        assert!(issues.contains(&ConfigIssue::SharedDescriptor {
            first: "next".to_string(),
            second: "advance".to_string()
        }));
        assert_eq!(issues.len(), 4);
    }

    #[test]
    fn wildcard_is_not_a_message_reference() {
        let messages = MessageRegistry::new();
        let behaviors = vec![
            ("red".to_string(), entry(Behavior::new().otherwise(|_, _, _| Light::Red))),
            ("yellow".to_string(), entry(Behavior::new())),
            ("green".to_string(), entry(Behavior::new())),
        ];

        assert!(validate(&light_states(), &messages, &behaviors).is_ok());
    }
}
