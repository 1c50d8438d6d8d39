//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process identifier.
///
/// A stable integer id in `[0, N)`, where N is fixed for the lifetime of a
/// simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl ProcessId {
    /// Get the id as a usize index into per-process arrays.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Message identifier, unique within a simulation run.
///
/// `seq` is the sender's own event count at send time, so no global counter
/// is needed: a process's own count strictly increases with every send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId {
    /// Originating process.
    pub sender: ProcessId,
    /// Sender's own event count when the message was constructed.
    pub seq: u64,
}

impl MessageId {
    /// Create a new message id.
    pub fn new(sender: ProcessId, seq: u64) -> Self {
        Self { sender, seq }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}.{}", self.sender.0, self.seq)
    }
}
