//! The immutable message record exchanged between processes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Clock, MessageId, ProcessId};

/// A message in flight between two processes.
///
/// Immutable once constructed. The snapshot is a deep copy of the sender's
/// clock taken at send time; the sender's live clock keeps mutating after
/// the send, so sharing a reference here would corrupt the causal record.
/// Messages are shared read-only between the sender and all receivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    sender: ProcessId,
    snapshot: Clock,
    label: String,
}

impl Message {
    /// Construct a message from a sender's clock snapshot.
    pub fn new(id: MessageId, sender: ProcessId, snapshot: Clock, label: impl Into<String>) -> Self {
        Self {
            id,
            sender,
            snapshot,
            label: label.into(),
        }
    }

    /// Unique id of this message.
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// The process that constructed this message.
    pub fn sender(&self) -> ProcessId {
        self.sender
    }

    /// The sender's clock as of the send event.
    pub fn snapshot(&self) -> &Clock {
        &self.snapshot
    }

    /// Opaque payload label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' from {} @ {}",
            self.id, self.label, self.sender, self.snapshot
        )
    }
}
