//! Machina: a staged finite state machine builder
//!
//! A machine is declared once as a [`Description`] and stamped into any
//! number of independent [`Machine`] instances. States are named predicates
//! over a single root value type, messages are opaque descriptors, and each
//! state owns a behavior entry with message handlers and an optional entry
//! hook.
//!
//! # Core Concepts
//!
//! - **States**: named predicates that classify the current value
//! - **Messages**: descriptors with unique ids, sent by name or by handle
//! - **Behaviors**: per-state handlers plus lifecycle hooks, compared by identity
//! - **Observers**: optional per-instance broadcast of every committed value
//!
//! # Example
//!
//! ```rust
//! use machina::builder::StateMachineBuilder;
//! use machina::core::{Behavior, Hooks, MessageRegistry};
//! use machina::states;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Player {
//!     Idle,
//!     Playing { time: u32 },
//!     Paused { time: u32 },
//! }
//!
//! let player = StateMachineBuilder::new()
//!     .states(states!(Player {
//!         "idle" => Player::Idle,
//!         "playing" => Player::Playing { .. },
//!         "paused" => Player::Paused { .. },
//!     }))
//!     .with_initial_state(|_: ()| Player::Idle)
//!     .messages(
//!         MessageRegistry::new()
//!             .declare("play")
//!             .declare("pause")
//!             .declare("seek"),
//!     )
//!     .behaviors([
//!         (
//!             "idle",
//!             Behavior::<Player, u32>::new().on("play", |_, _, _| Player::Playing { time: 0 }),
//!         ),
//!         (
//!             "playing",
//!             Behavior::new()
//!                 .on_enter(|_, _| Hooks::new().on_exit(|_| {}))
//!                 .on("seek", |_, _, time| Player::Playing { time })
//!                 .on("pause", |_, current, _| match current {
//!                     Player::Playing { time } => Player::Paused { time: *time },
//!                     other => other.clone(),
//!                 }),
//!         ),
//!         (
//!             "paused",
//!             Behavior::new().on("play", |_, _, _| Player::Playing { time: 0 }),
//!         ),
//!     ])
//!     .unwrap()
//!     .instantiate(())
//!     .unwrap();
//!
//! player.send("play", 0).unwrap();
//! player.send("seek", 2).unwrap();
//! player.send("pause", 0).unwrap();
//! assert_eq!(player.value(), Player::Paused { time: 2 });
//! ```

pub mod builder;
pub mod core;
pub mod observable;
pub mod runtime;

// Re-export commonly used types
pub use builder::{ConfigurationError, StateMachineBuilder};
pub use crate::core::{Behavior, Hooks, MessageDescriptor, MessageRegistry, StateRegistry};
pub use observable::{ObservableDescription, ObservableMachine, Observer, Subscription};
pub use runtime::{Description, DispatchError, Machine, Sender, WeakMachine};
