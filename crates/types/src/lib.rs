//! Core types for the causal-ordering simulation.
//!
//! This crate holds the value types shared by every layer: process and
//! message identifiers, the two logical clock representations (vector and
//! matrix), and the immutable [`Message`] record that carries a clock
//! snapshot between processes.
//!
//! Everything here is plain data with value semantics. Clock snapshots are
//! deep copies (`Clone`), so mutating a live clock never retroactively
//! alters a previously constructed message.

mod clock;
mod error;
mod identifiers;
mod message;

pub use clock::{Clock, ClockKind, ClockOrdering, MatrixClock, VectorClock};
pub use error::MessageError;
pub use identifiers::{MessageId, ProcessId};
pub use message::Message;
