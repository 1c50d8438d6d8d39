//! Delivery-condition policies and the observer boundary.
//!
//! The causal delivery engine is deterministic and synchronous: a process
//! evaluates a [`DeliveryPolicy`] predicate against its local clock, and the
//! policy also defines how clocks merge on delivery. All presentation
//! concerns (rendering, pacing, logging to a screen) live behind the
//! [`DeliveryObserver`] trait, which receives events and has no influence on
//! protocol state.
//!
//! # Architecture
//!
//! ```text
//! Process::receive(msg)
//!     │
//!     ▼
//! DeliveryPolicy::is_deliverable(local clock, msg)
//!     │ yes                          │ no
//!     ▼                              ▼
//! apply_delivery + drain         pending buffer
//!     │                              │
//!     ▼                              ▼
//! observer.on_delivered          observer.on_buffered
//! ```

mod observer;
mod policy;

pub use observer::{DeliveryObserver, EventRecorder, NullObserver, ObservedEvent};
pub use policy::{DeliveryPolicy, DeliveryStatus};
