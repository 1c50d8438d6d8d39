//! Observer boundary between the protocol core and any front end.
//!
//! The engine fires these callbacks synchronously as events happen; the
//! observer receives copies of protocol state and can never influence it.
//! A GUI, CLI, or test harness plugs in here instead of being called from
//! protocol code directly.

use serde::{Deserialize, Serialize};

use causalsim_types::{Clock, Message, MessageId, ProcessId};

/// Receiver of simulation events.
///
/// All methods default to no-ops so observers only implement what they need.
pub trait DeliveryObserver {
    /// Fired synchronously after a message is constructed, before delivery.
    fn on_send(&mut self, sender: ProcessId, receiver: ProcessId, message: &Message) {
        let _ = (sender, receiver, message);
    }

    /// Fired synchronously after a successful delivery, including deliveries
    /// cascaded out of the pending buffer.
    fn on_delivered(&mut self, process: ProcessId, message: &Message, updated_clock: &Clock) {
        let _ = (process, message, updated_clock);
    }

    /// Fired when a message's causal prerequisites are unmet and it is
    /// parked in the pending buffer.
    fn on_buffered(&mut self, process: ProcessId, message: &Message) {
        let _ = (process, message);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl DeliveryObserver for NullObserver {}

/// A single recorded simulation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservedEvent {
    /// A message was constructed and handed off.
    Send {
        /// Constructing process.
        sender: ProcessId,
        /// Intended receiver.
        receiver: ProcessId,
        /// Id of the new message.
        message: MessageId,
    },
    /// A message was delivered at a process.
    Delivered {
        /// Delivering process.
        process: ProcessId,
        /// Id of the delivered message.
        message: MessageId,
        /// The process's clock after the merge.
        clock: Clock,
    },
    /// A message was parked in a process's pending buffer.
    Buffered {
        /// Buffering process.
        process: ProcessId,
        /// Id of the buffered message.
        message: MessageId,
    },
}

impl ObservedEvent {
    /// Get a human-readable name for this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            ObservedEvent::Send { .. } => "Send",
            ObservedEvent::Delivered { .. } => "Delivered",
            ObservedEvent::Buffered { .. } => "Buffered",
        }
    }
}

/// Observer that records every event in order, for tests and transcripts.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<ObservedEvent>,
}

impl EventRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in firing order.
    pub fn events(&self) -> &[ObservedEvent] {
        &self.events
    }

    /// Ids of messages delivered at `process`, in delivery order.
    pub fn delivered_at(&self, process: ProcessId) -> Vec<MessageId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::Delivered {
                    process: p,
                    message,
                    ..
                } if *p == process => Some(*message),
                _ => None,
            })
            .collect()
    }

    /// Number of events of each kind: (sends, delivered, buffered).
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for event in &self.events {
            match event {
                ObservedEvent::Send { .. } => counts.0 += 1,
                ObservedEvent::Delivered { .. } => counts.1 += 1,
                ObservedEvent::Buffered { .. } => counts.2 += 1,
            }
        }
        counts
    }
}

impl DeliveryObserver for EventRecorder {
    fn on_send(&mut self, sender: ProcessId, receiver: ProcessId, message: &Message) {
        self.events.push(ObservedEvent::Send {
            sender,
            receiver,
            message: message.id(),
        });
    }

    fn on_delivered(&mut self, process: ProcessId, message: &Message, updated_clock: &Clock) {
        self.events.push(ObservedEvent::Delivered {
            process,
            message: message.id(),
            clock: updated_clock.clone(),
        });
    }

    fn on_buffered(&mut self, process: ProcessId, message: &Message) {
        self.events.push(ObservedEvent::Buffered {
            process,
            message: message.id(),
        });
    }
}
