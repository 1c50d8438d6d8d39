//! Deterministic simulation context for the causal delivery engine.
//!
//! This crate owns the process group and drives scripted or seeded-random
//! sequences of send/receive calls across it, reporting every event to an
//! external observer. Given the same scenario (or the same seed), a run
//! produces identical results every time.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                     Simulation                        │
//! │                                                       │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │  Scenario ops: Send / Broadcast / Deliver / ... │  │
//! │  └───────────────────────┬─────────────────────────┘  │
//! │                          │                            │
//! │                          ▼                            │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │  in-flight messages, keyed (label, receiver)    │  │
//! │  └───────────────────────┬─────────────────────────┘  │
//! │                          │                            │
//! │                          ▼                            │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │  processes: Vec<Process> — sequential receive,  │  │
//! │  │  buffering and cascades driven by the policy    │  │
//! │  └─────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! Delivery is explicit: a `Send` op only constructs the message and holds
//! it in flight, so scenarios can reorder deliveries at will to exercise
//! buffering. There is no simulated network delay; pacing belongs to front
//! ends, never to the core.

mod runner;
mod scenario;
mod stats;

pub use runner::{Simulation, SimulationError};
pub use scenario::{Scenario, ScenarioOp};
pub use stats::SimulationStats;
