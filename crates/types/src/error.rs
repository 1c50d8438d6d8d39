//! Error types for message validation.

use thiserror::Error;

use crate::ClockKind;

/// Contract violations detected when a process receives a message.
///
/// These are programming errors in the driver, not runtime network
/// conditions: a malformed message is rejected immediately rather than
/// buffered. Buffering itself is never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The sender id does not fall inside the receiver's process group.
    #[error("sender {sender} out of range for a group of {num_processes} processes")]
    SenderOutOfRange {
        /// Raw sender id carried by the message.
        sender: u32,
        /// Size of the receiver's process group.
        num_processes: usize,
    },

    /// The snapshot's dimensionality does not match the receiver's group.
    #[error("clock snapshot tracks {snapshot} processes, receiver tracks {local}")]
    DimensionMismatch {
        /// Dimension of the message's snapshot.
        snapshot: usize,
        /// Dimension of the receiver's clock.
        local: usize,
    },

    /// The snapshot's representation does not match the run's policy.
    #[error("message carries a {snapshot} clock but this run uses {local} clocks")]
    ClockKindMismatch {
        /// Kind carried by the message.
        snapshot: ClockKind,
        /// Kind the receiver's policy operates on.
        local: ClockKind,
    },
}
