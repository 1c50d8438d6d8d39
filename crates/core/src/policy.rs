//! The three delivery-condition algorithms.
//!
//! A policy is selected once per simulation run and never changed mid-run.
//! All three share the same contract: a deliverability predicate evaluated
//! against the receiver's current clock, and a merge rule applied on
//! delivery. The predicates assume the message has already passed the
//! malformed-message checks in `Process::receive` (matching clock kind and
//! dimension, in-range sender).

use serde::{Deserialize, Serialize};
use std::fmt;

use causalsim_types::{Clock, ClockKind, MatrixClock, Message, ProcessId, VectorClock};

/// Outcome of handing a message to a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Causal prerequisites were satisfied; the message was applied.
    Delivered,
    /// Prerequisites unmet; the message is parked in the pending buffer.
    /// This is expected steady-state behavior, not an error.
    Buffered,
    /// The message was already delivered here; receive was a no-op.
    Duplicate,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Delivered => write!(f, "delivered"),
            DeliveryStatus::Buffered => write!(f, "buffered"),
            DeliveryStatus::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// Pluggable delivery-condition algorithm.
///
/// - [`VectorFull`](DeliveryPolicy::VectorFull): BSS-style causal broadcast.
///   Deliverable iff the message is exactly next in sequence from its sender
///   AND every causal predecessor known to the sender has been observed
///   locally.
/// - [`VectorSingleDependency`](DeliveryPolicy::VectorSingleDependency):
///   SES-style reduced check. Only the sender-immediacy clause; strictly
///   weaker than `VectorFull` (ignores transitive dependencies).
/// - [`Matrix`](DeliveryPolicy::Matrix): matrix-clock check over diagonal
///   entries; delivery itself counts as a local event at the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryPolicy {
    /// Full vector-clock causal-broadcast check.
    VectorFull,
    /// Sender-only vector-clock check.
    VectorSingleDependency,
    /// Matrix-clock causal check.
    Matrix,
}

impl DeliveryPolicy {
    /// Which clock representation this policy operates on.
    pub fn clock_kind(&self) -> ClockKind {
        match self {
            DeliveryPolicy::VectorFull | DeliveryPolicy::VectorSingleDependency => {
                ClockKind::Vector
            }
            DeliveryPolicy::Matrix => ClockKind::Matrix,
        }
    }

    /// A zeroed clock of the shape this policy needs.
    pub fn initial_clock(&self, num_processes: usize) -> Clock {
        match self.clock_kind() {
            ClockKind::Vector => Clock::Vector(VectorClock::new(num_processes)),
            ClockKind::Matrix => Clock::Matrix(MatrixClock::new(num_processes)),
        }
    }

    /// Evaluate the deliverability predicate for `message` at a receiver
    /// whose current clock is `local`.
    ///
    /// The message must have passed validation: same clock kind and
    /// dimension as `local`, sender in range. A kind mismatch here returns
    /// `false` defensively but is rejected upstream in `Process::receive`.
    pub fn is_deliverable(&self, local: &Clock, message: &Message) -> bool {
        let sender = message.sender();
        match (self, local, message.snapshot()) {
            (DeliveryPolicy::VectorFull, Clock::Vector(local), Clock::Vector(ts)) => {
                vector_sender_immediate(local, ts, sender)
                    && vector_others_observed(local, ts, sender)
            }
            (DeliveryPolicy::VectorSingleDependency, Clock::Vector(local), Clock::Vector(ts)) => {
                vector_sender_immediate(local, ts, sender)
            }
            (DeliveryPolicy::Matrix, Clock::Matrix(local), Clock::Matrix(ts)) => {
                matrix_deliverable(local, ts, sender)
            }
            _ => false,
        }
    }

    /// Apply a delivery: merge the snapshot into the local clock by
    /// component-wise maximum. For matrix clocks the delivery is itself a
    /// local event, so the receiver's own diagonal is additionally bumped —
    /// there is no analogue of that step for vector clocks.
    pub fn apply_delivery(&self, local: &mut Clock, receiver: ProcessId, message: &Message) {
        local.merge(message.snapshot());
        if let DeliveryPolicy::Matrix = self {
            local.record_local_event(receiver);
        }
    }
}

impl fmt::Display for DeliveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryPolicy::VectorFull => write!(f, "vector-full"),
            DeliveryPolicy::VectorSingleDependency => write!(f, "vector-single"),
            DeliveryPolicy::Matrix => write!(f, "matrix"),
        }
    }
}

/// Sender-immediacy clause: the message is exactly the next event from its
/// sender, i.e. `ts[s] == local[s] + 1`. No gaps, no re-delivery.
fn vector_sender_immediate(local: &VectorClock, ts: &VectorClock, sender: ProcessId) -> bool {
    ts.get(sender) == local.get(sender) + 1
}

/// Causal-predecessor clause: everything the sender had observed from third
/// parties has also been observed locally (`local[k] >= ts[k]` for k != s).
fn vector_others_observed(local: &VectorClock, ts: &VectorClock, sender: ProcessId) -> bool {
    (0..local.len())
        .map(|k| ProcessId(k as u32))
        .filter(|&k| k != sender)
        .all(|k| local.get(k) >= ts.get(k))
}

/// Matrix-clock check over diagonal entries: the sender's self-reported
/// count is exactly one ahead of what the receiver attributes to it, and the
/// sender's transitive knowledge of everyone else is not ahead of the
/// receiver's own.
fn matrix_deliverable(local: &MatrixClock, ts: &MatrixClock, sender: ProcessId) -> bool {
    if ts.diagonal(sender) != local.diagonal(sender) + 1 {
        return false;
    }
    (0..local.dimension())
        .map(|p| ProcessId(p as u32))
        .filter(|&p| p != sender)
        .all(|p| ts.diagonal(p) <= local.diagonal(p))
}
