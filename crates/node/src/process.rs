//! Process state: clock, delivered log, pending buffer.

use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, trace, warn};

use causalsim_core::{DeliveryObserver, DeliveryPolicy, DeliveryStatus};
use causalsim_types::{Clock, Message, MessageError, MessageId, ProcessId};

/// One simulated process.
///
/// The process exclusively owns and mutates its clock, delivered log, and
/// pending buffer. Messages are shared read-only with receivers via deep
/// clock snapshots, so no mutable state ever crosses a process boundary.
///
/// The pending buffer keeps insertion order (`IndexMap`), which makes the
/// cascade order among simultaneously-deliverable messages deterministic.
pub struct Process {
    /// Stable id in `[0, num_processes)`.
    id: ProcessId,

    /// Size of the process group, fixed for the run.
    num_processes: usize,

    /// Delivery-condition algorithm for this run. Never changes mid-run.
    policy: DeliveryPolicy,

    /// Owned clock; shape matches the policy.
    clock: Clock,

    /// Ids of delivered messages, in delivery order.
    delivered: Vec<MessageId>,

    /// Fast membership check backing the duplicate-delivery guard.
    delivered_set: HashSet<MessageId>,

    /// Messages received but not yet deliverable, in arrival order.
    pending: IndexMap<MessageId, Message>,
}

impl Process {
    /// Create a process with a zeroed clock and empty buffer/log.
    pub fn new(id: ProcessId, num_processes: usize, policy: DeliveryPolicy) -> Self {
        Self {
            id,
            num_processes,
            policy,
            clock: policy.initial_clock(num_processes),
            delivered: Vec::new(),
            delivered_set: HashSet::new(),
            pending: IndexMap::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    /// This process's id.
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// The delivery policy this process runs under.
    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// The current clock.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Delivered message ids, in delivery order.
    pub fn delivered(&self) -> &[MessageId] {
        &self.delivered
    }

    /// Number of messages parked in the pending buffer.
    ///
    /// A permanently non-deliverable message (e.g. a gap left by a message
    /// that never arrives) shows up here; there is no timeout that clears it.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// True if any message is awaiting its causal prerequisites.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Ids currently in the pending buffer, in arrival order.
    pub fn pending_ids(&self) -> Vec<MessageId> {
        self.pending.keys().copied().collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Send a message to another process.
    ///
    /// A send is always a local event: the own clock entry (vector index or
    /// matrix diagonal) is incremented unconditionally, then the updated
    /// clock is deep-copied into the new message. Runs to completion without
    /// suspension, performs no I/O, never fails. The caller routes the
    /// returned message to the target.
    pub fn send(
        &mut self,
        to: ProcessId,
        label: impl Into<String>,
        observer: &mut dyn DeliveryObserver,
    ) -> Message {
        self.clock.record_local_event(self.id);
        let seq = self.clock.own_count(self.id);
        let message = Message::new(
            MessageId::new(self.id, seq),
            self.id,
            self.clock.clone(),
            label,
        );

        debug!(
            sender = %self.id,
            receiver = %to,
            message = %message.id(),
            clock = %self.clock,
            "Send"
        );
        observer.on_send(self.id, to, &message);
        message
    }

    /// Receive a message: deliver it if its causal prerequisites hold,
    /// otherwise park it in the pending buffer.
    ///
    /// A successful delivery re-scans the buffer until a fixed point, so one
    /// receive can cascade into several deliveries. Buffering is the normal
    /// outcome for an out-of-order message, never an error; only a malformed
    /// message (wrong clock kind or dimension, sender out of range) is
    /// rejected with an `Err`.
    pub fn receive(
        &mut self,
        message: Message,
        observer: &mut dyn DeliveryObserver,
    ) -> Result<DeliveryStatus, MessageError> {
        self.validate(&message)?;

        if self.delivered_set.contains(&message.id()) {
            debug!(
                process = %self.id,
                message = %message.id(),
                "Duplicate receive of a delivered message, ignoring"
            );
            return Ok(DeliveryStatus::Duplicate);
        }
        if self.pending.contains_key(&message.id()) {
            // Already parked; re-receipt changes nothing.
            return Ok(DeliveryStatus::Buffered);
        }

        if self.policy.is_deliverable(&self.clock, &message) {
            self.deliver(message, observer);
            self.drain_pending(observer);
            Ok(DeliveryStatus::Delivered)
        } else {
            debug!(
                process = %self.id,
                message = %message.id(),
                clock = %self.clock,
                "Buffered, causal prerequisites unmet"
            );
            observer.on_buffered(self.id, &message);
            self.pending.insert(message.id(), message);
            Ok(DeliveryStatus::Buffered)
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Internals
    // ═══════════════════════════════════════════════════════════════════════

    /// Fail fast on contract violations before any buffering.
    fn validate(&self, message: &Message) -> Result<(), MessageError> {
        if message.sender().index() >= self.num_processes {
            warn!(process = %self.id, sender = %message.sender(), "Sender out of range");
            return Err(MessageError::SenderOutOfRange {
                sender: message.sender().0,
                num_processes: self.num_processes,
            });
        }
        if message.snapshot().kind() != self.clock.kind() {
            warn!(
                process = %self.id,
                snapshot = %message.snapshot().kind(),
                local = %self.clock.kind(),
                "Clock kind mismatch"
            );
            return Err(MessageError::ClockKindMismatch {
                snapshot: message.snapshot().kind(),
                local: self.clock.kind(),
            });
        }
        if message.snapshot().dimension() != self.clock.dimension() {
            warn!(
                process = %self.id,
                snapshot = message.snapshot().dimension(),
                local = self.clock.dimension(),
                "Clock dimension mismatch"
            );
            return Err(MessageError::DimensionMismatch {
                snapshot: message.snapshot().dimension(),
                local: self.clock.dimension(),
            });
        }
        Ok(())
    }

    /// Apply a delivery: merge clocks per the policy and append to the log.
    fn deliver(&mut self, message: Message, observer: &mut dyn DeliveryObserver) {
        self.policy.apply_delivery(&mut self.clock, self.id, &message);
        self.delivered.push(message.id());
        self.delivered_set.insert(message.id());

        debug!(
            process = %self.id,
            message = %message.id(),
            clock = %self.clock,
            "Delivered"
        );
        observer.on_delivered(self.id, &message, &self.clock);
    }

    /// Re-scan the pending buffer until one full pass delivers nothing.
    ///
    /// Each pass walks the buffer in arrival order and delivers every
    /// message whose predicate holds at that moment. Termination: a pass
    /// either shrinks the buffer or reaches the fixed point.
    fn drain_pending(&mut self, observer: &mut dyn DeliveryObserver) {
        loop {
            let mut delivered_this_pass = false;
            // Predicates can change as the pass delivers, so each candidate
            // is re-checked against the current clock at its turn.
            for id in self.pending_ids() {
                let deliverable = self
                    .pending
                    .get(&id)
                    .is_some_and(|m| self.policy.is_deliverable(&self.clock, m));
                if deliverable {
                    // shift_remove keeps arrival order for the rest.
                    if let Some(message) = self.pending.shift_remove(&id) {
                        trace!(process = %self.id, message = %id, "Draining buffered message");
                        self.deliver(message, observer);
                        delivered_this_pass = true;
                    }
                }
            }
            if !delivered_this_pass {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causalsim_core::{EventRecorder, NullObserver};
    use causalsim_types::{MatrixClock, VectorClock};
    use tracing_test::traced_test;

    fn group(policy: DeliveryPolicy, n: usize) -> Vec<Process> {
        (0..n)
            .map(|i| Process::new(ProcessId(i as u32), n, policy))
            .collect()
    }

    #[test]
    fn test_send_increments_own_entry_by_one_each_time() {
        let mut p = Process::new(ProcessId(0), 3, DeliveryPolicy::VectorFull);
        let mut obs = NullObserver;
        for expected in 1..=4 {
            let msg = p.send(ProcessId(1), "m", &mut obs);
            assert_eq!(p.clock().own_count(ProcessId(0)), expected);
            assert_eq!(msg.id().seq, expected);
            assert_eq!(msg.snapshot().own_count(ProcessId(0)), expected);
        }
    }

    #[test]
    fn test_snapshot_not_affected_by_later_sends() {
        let mut p = Process::new(ProcessId(0), 2, DeliveryPolicy::VectorFull);
        let mut obs = NullObserver;
        let first = p.send(ProcessId(1), "first", &mut obs);
        p.send(ProcessId(1), "second", &mut obs);
        p.send(ProcessId(1), "third", &mut obs);
        assert_eq!(first.snapshot().own_count(ProcessId(0)), 1);
    }

    #[test]
    fn test_in_order_delivery() {
        let mut group = group(DeliveryPolicy::VectorFull, 2);
        let mut obs = NullObserver;
        let msg = group[0].send(ProcessId(1), "m1", &mut obs);
        let status = group[1].receive(msg.clone(), &mut obs).unwrap();
        assert_eq!(status, DeliveryStatus::Delivered);
        assert_eq!(group[1].delivered(), &[msg.id()]);
        assert_eq!(group[1].clock().own_count(ProcessId(0)), 1);
    }

    #[traced_test]
    #[test]
    fn test_transitive_dependency_gates_delivery() {
        // P0 sends m1 to P2 and m2 to P1; P1 delivers m2 and sends m3 to
        // P2. m3's snapshot carries knowledge of both P0 events, so at P2
        // it must buffer, and delivering m1 alone (P0's first event) must
        // not release it: the dependency on P0's second event stays open.
        let mut procs = group(DeliveryPolicy::VectorFull, 3);
        let mut obs = EventRecorder::new();

        let m1 = procs[0].send(ProcessId(2), "m1", &mut obs);
        assert_eq!(procs[0].clock().to_string(), "[1,0,0]");

        let m2 = procs[0].send(ProcessId(1), "m2", &mut obs);
        assert_eq!(
            procs[1].receive(m2, &mut obs).unwrap(),
            DeliveryStatus::Delivered
        );
        assert_eq!(procs[1].clock().to_string(), "[2,0,0]");

        let m3 = procs[1].send(ProcessId(2), "m3", &mut obs);
        assert_eq!(m3.snapshot().to_string(), "[2,1,0]");

        assert_eq!(
            procs[2].receive(m3.clone(), &mut obs).unwrap(),
            DeliveryStatus::Buffered
        );
        assert_eq!(procs[2].pending_len(), 1);
        assert!(procs[2].delivered().is_empty());

        assert_eq!(
            procs[2].receive(m1, &mut obs).unwrap(),
            DeliveryStatus::Delivered
        );

        // m3 needs L[0] >= 2, which m1 alone cannot provide.
        assert_eq!(procs[2].pending_len(), 1);
        assert_eq!(procs[2].clock().own_count(ProcessId(0)), 1);
    }

    #[test]
    fn test_cascade_releases_buffered_message() {
        // Two-process variant where the cascade does fire: P0 sends m1 then
        // m2; P1 sees m2 first (buffered), then m1 (delivered), and the
        // drain must release m2 in the same receive call.
        let mut procs = group(DeliveryPolicy::VectorFull, 2);
        let mut obs = EventRecorder::new();

        let m1 = procs[0].send(ProcessId(1), "m1", &mut obs);
        let m2 = procs[0].send(ProcessId(1), "m2", &mut obs);

        assert_eq!(
            procs[1].receive(m2.clone(), &mut obs).unwrap(),
            DeliveryStatus::Buffered
        );
        assert_eq!(
            procs[1].receive(m1.clone(), &mut obs).unwrap(),
            DeliveryStatus::Delivered
        );

        assert_eq!(procs[1].delivered(), &[m1.id(), m2.id()]);
        assert_eq!(procs[1].pending_len(), 0);
        assert_eq!(obs.delivered_at(ProcessId(1)), vec![m1.id(), m2.id()]);
    }

    #[test]
    fn test_cascade_fixed_point_across_multiple_messages() {
        // m3, m2 buffered; m1 unlocks m2 which unlocks m3 on the next pass.
        let mut procs = group(DeliveryPolicy::VectorFull, 2);
        let mut obs = NullObserver;

        let m1 = procs[0].send(ProcessId(1), "m1", &mut obs);
        let m2 = procs[0].send(ProcessId(1), "m2", &mut obs);
        let m3 = procs[0].send(ProcessId(1), "m3", &mut obs);

        assert_eq!(
            procs[1].receive(m3.clone(), &mut obs).unwrap(),
            DeliveryStatus::Buffered
        );
        assert_eq!(
            procs[1].receive(m2.clone(), &mut obs).unwrap(),
            DeliveryStatus::Buffered
        );
        assert_eq!(
            procs[1].receive(m1.clone(), &mut obs).unwrap(),
            DeliveryStatus::Delivered
        );

        assert_eq!(procs[1].delivered(), &[m1.id(), m2.id(), m3.id()]);
        assert!(!procs[1].has_pending());
    }

    #[test]
    fn test_single_dependency_ignores_third_party_gap() {
        let mut procs = group(DeliveryPolicy::VectorSingleDependency, 3);
        let mut obs = NullObserver;

        let _m1 = procs[0].send(ProcessId(2), "m1", &mut obs);
        let m2 = procs[0].send(ProcessId(1), "m2", &mut obs);
        procs[1].receive(m2, &mut obs).unwrap();
        let m3 = procs[1].send(ProcessId(2), "m3", &mut obs);

        // Under the sender-only check, m3 delivers at P2 even though P2
        // never saw any of P0's events.
        assert_eq!(
            procs[2].receive(m3, &mut obs).unwrap(),
            DeliveryStatus::Delivered
        );
    }

    #[test]
    fn test_matrix_delivery_counts_as_local_event() {
        let mut procs = group(DeliveryPolicy::Matrix, 2);
        let mut obs = NullObserver;

        let m1 = procs[0].send(ProcessId(1), "m1", &mut obs);
        let before = procs[1].clock().own_count(ProcessId(1));

        assert_eq!(
            procs[1].receive(m1, &mut obs).unwrap(),
            DeliveryStatus::Delivered
        );
        assert_eq!(procs[1].clock().own_count(ProcessId(1)), before + 1);
        assert_eq!(procs[1].clock().own_count(ProcessId(0)), 1);
    }

    #[test]
    fn test_matrix_out_of_order_buffers_then_drains() {
        let mut procs = group(DeliveryPolicy::Matrix, 2);
        let mut obs = NullObserver;

        let m1 = procs[0].send(ProcessId(1), "m1", &mut obs);
        let m2 = procs[0].send(ProcessId(1), "m2", &mut obs);

        assert_eq!(
            procs[1].receive(m2.clone(), &mut obs).unwrap(),
            DeliveryStatus::Buffered
        );
        assert_eq!(
            procs[1].receive(m1.clone(), &mut obs).unwrap(),
            DeliveryStatus::Delivered
        );
        assert_eq!(procs[1].delivered(), &[m1.id(), m2.id()]);
        // Two deliveries, each a local event at the receiver.
        assert_eq!(procs[1].clock().own_count(ProcessId(1)), 2);
    }

    #[test]
    fn test_duplicate_delivery_is_noop() {
        let mut procs = group(DeliveryPolicy::VectorFull, 2);
        let mut obs = NullObserver;

        let m1 = procs[0].send(ProcessId(1), "m1", &mut obs);
        assert_eq!(
            procs[1].receive(m1.clone(), &mut obs).unwrap(),
            DeliveryStatus::Delivered
        );
        let clock_after = procs[1].clock().clone();

        assert_eq!(
            procs[1].receive(m1.clone(), &mut obs).unwrap(),
            DeliveryStatus::Duplicate
        );
        assert_eq!(procs[1].delivered().len(), 1);
        assert_eq!(procs[1].clock(), &clock_after);
    }

    #[test]
    fn test_malformed_messages_fail_fast() {
        let mut p = Process::new(ProcessId(1), 2, DeliveryPolicy::VectorFull);
        let mut obs = NullObserver;

        // Sender outside the group.
        let bad_sender = Message::new(
            MessageId::new(ProcessId(7), 1),
            ProcessId(7),
            Clock::Vector(VectorClock::new(2)),
            "x",
        );
        assert!(matches!(
            p.receive(bad_sender, &mut obs),
            Err(MessageError::SenderOutOfRange { sender: 7, .. })
        ));

        // Wrong clock representation for a vector-policy run.
        let wrong_kind = Message::new(
            MessageId::new(ProcessId(0), 1),
            ProcessId(0),
            Clock::Matrix(MatrixClock::new(2)),
            "x",
        );
        assert!(matches!(
            p.receive(wrong_kind, &mut obs),
            Err(MessageError::ClockKindMismatch { .. })
        ));

        // Wrong dimensionality.
        let wrong_dim = Message::new(
            MessageId::new(ProcessId(0), 1),
            ProcessId(0),
            Clock::Vector(VectorClock::new(3)),
            "x",
        );
        assert!(matches!(
            p.receive(wrong_dim, &mut obs),
            Err(MessageError::DimensionMismatch {
                snapshot: 3,
                local: 2
            })
        ));

        // Nothing was buffered or delivered.
        assert!(!p.has_pending());
        assert!(p.delivered().is_empty());
    }

    #[test]
    fn test_permanent_buffering_is_observable() {
        // m2 without m1: under VectorFull the gap never closes.
        let mut procs = group(DeliveryPolicy::VectorFull, 2);
        let mut obs = NullObserver;

        let _m1_lost = procs[0].send(ProcessId(1), "m1", &mut obs);
        let m2 = procs[0].send(ProcessId(1), "m2", &mut obs);

        assert_eq!(
            procs[1].receive(m2.clone(), &mut obs).unwrap(),
            DeliveryStatus::Buffered
        );
        assert!(procs[1].has_pending());
        assert_eq!(procs[1].pending_ids(), vec![m2.id()]);
    }

    #[test]
    fn test_pending_buffer_has_no_deliverable_message_after_receive() {
        // Fixed-point property: after any receive, every message still in
        // the buffer fails the predicate.
        let mut procs = group(DeliveryPolicy::VectorFull, 2);
        let mut obs = NullObserver;

        let msgs: Vec<Message> = (0..5)
            .map(|i| procs[0].send(ProcessId(1), format!("m{i}"), &mut obs))
            .collect();

        // Deliver in a scrambled order.
        for idx in [3, 1, 4, 0, 2] {
            procs[1].receive(msgs[idx].clone(), &mut obs).unwrap();
            let receiver = &procs[1];
            for id in receiver.pending_ids() {
                let msg = msgs.iter().find(|m| m.id() == id).unwrap();
                assert!(
                    !receiver.policy().is_deliverable(receiver.clock(), msg),
                    "buffer still holds a deliverable message"
                );
            }
        }
        assert_eq!(procs[1].delivered().len(), 5);
    }
}
