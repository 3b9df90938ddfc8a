//! Macros for ergonomic state declaration.

/// Build a [`StateRegistry`](crate::core::StateRegistry) from patterns.
///
/// Each state is recognized by a `matches!` pattern over the root value
/// type. States are registered in the order written.
///
/// # Example
///
/// ```
/// use machina::states;
///
/// #[derive(Clone, Debug)]
/// enum Player {
///     Idle,
///     Playing { time: u32 },
///     Paused { time: u32 },
/// }
///
/// let states = states!(Player {
///     "idle" => Player::Idle,
///     "playing" => Player::Playing { .. },
///     "paused" => Player::Paused { .. },
/// });
///
/// assert_eq!(states.resolve(&Player::Paused { time: 4 }), Some("paused"));
/// ```
#[macro_export]
macro_rules! states {
    (
        $ty:ty {
            $($name:literal => $pattern:pat),* $(,)?
        }
    ) => {
        $crate::core::StateRegistry::<$ty>::new()
            $(.register($name, |value: &$ty| matches!(value, $pattern)))*
    };
}
