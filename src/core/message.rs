//! Message descriptors and the registry that names them.
//!
//! Message identity is an opaque id handed out by a process-wide monotonic
//! counter. Names only exist in a [`MessageRegistry`]; dispatch resolves a
//! descriptor back to its name through the id, never the other way round.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, unique message identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MessageId(u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle identifying one declared message.
///
/// Two descriptors are equal only if they came from the same
/// [`MessageDescriptor::create`] call.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MessageDescriptor {
    id: MessageId,
}

impl MessageDescriptor {
    /// Allocate a descriptor with a fresh id.
    pub fn create() -> Self {
        let id = NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed);
        Self { id: MessageId(id) }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Stamp this descriptor's id onto a payload.
    pub fn stamp<P>(&self, payload: P) -> MessageInstance<P> {
        MessageInstance {
            id: self.id,
            payload,
        }
    }
}

/// A payload tagged with the id of the message it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageInstance<P> {
    id: MessageId,
    payload: P,
}

impl<P> MessageInstance<P> {
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}

/// Named set of message descriptors declared for one machine.
///
/// # Example
///
/// ```rust
/// use machina::core::{MessageDescriptor, MessageRegistry};
///
/// let seek = MessageDescriptor::create();
/// let messages = MessageRegistry::new()
///     .declare("play")
///     .insert("seek", seek);
///
/// assert_eq!(messages.get("seek"), Some(seek));
/// assert_ne!(messages.get("play"), Some(seek));
/// ```
#[derive(Clone, Debug, Default)]
pub struct MessageRegistry {
    entries: Vec<(String, MessageDescriptor)>,
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a message under `name` with a freshly allocated descriptor.
    pub fn declare(self, name: impl Into<String>) -> Self {
        self.insert(name, MessageDescriptor::create())
    }

    /// Declare a message under `name` using an existing descriptor.
    pub fn insert(mut self, name: impl Into<String>, descriptor: MessageDescriptor) -> Self {
        self.entries.push((name.into(), descriptor));
        self
    }

    pub fn get(&self, name: &str) -> Option<MessageDescriptor> {
        self.entries
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, descriptor)| *descriptor)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(String, MessageDescriptor)] {
        &self.entries
    }

    pub(crate) fn name(&self, index: usize) -> &str {
        &self.entries[index].0
    }
}
