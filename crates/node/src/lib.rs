//! The simulated process state machine.
//!
//! A [`Process`] owns one clock, a delivered-message log, and a pending
//! buffer, and is the only entity that mutates them. Both operations are
//! synchronous and deterministic:
//!
//! - `send` → unconditional own-clock increment, deep snapshot, new message
//! - `receive` → policy predicate, then either deliver (merge + cascade
//!   through the pending buffer) or buffer
//!
//! Neither operation performs I/O or suspends. A buffered message is not an
//! error; a message whose prerequisites never arrive stays buffered forever,
//! visible through [`Process::pending_len`].

mod process;

pub use process::Process;
