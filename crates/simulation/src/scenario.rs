//! Scripted and seeded-random scenarios.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use causalsim_types::ProcessId;

/// One step of a scripted run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOp {
    /// Construct a message and hold it in flight to `to`.
    Send {
        /// Sending process.
        from: ProcessId,
        /// Target process.
        to: ProcessId,
        /// Label identifying the in-flight copy.
        label: String,
    },
    /// Construct a message and route it to `to` immediately.
    SendNow {
        /// Sending process.
        from: ProcessId,
        /// Target process.
        to: ProcessId,
        /// Payload label.
        label: String,
    },
    /// One send event whose snapshot fans out to every other process, each
    /// copy held in flight separately.
    Broadcast {
        /// Sending process.
        from: ProcessId,
        /// Label shared by all copies.
        label: String,
    },
    /// Route a held copy into its receiver.
    Deliver {
        /// Label given at send time.
        label: String,
        /// Receiver whose copy to deliver.
        to: ProcessId,
    },
    /// Route every held copy, in the order they were sent.
    DeliverAll,
}

/// An ordered list of scenario ops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    ops: Vec<ScenarioOp>,
}

impl Scenario {
    /// Create an empty scenario.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ops, in execution order.
    pub fn ops(&self) -> &[ScenarioOp] {
        &self.ops
    }

    /// Append a `Send` op.
    pub fn send(mut self, from: u32, to: u32, label: impl Into<String>) -> Self {
        self.ops.push(ScenarioOp::Send {
            from: ProcessId(from),
            to: ProcessId(to),
            label: label.into(),
        });
        self
    }

    /// Append a `SendNow` op.
    pub fn send_now(mut self, from: u32, to: u32, label: impl Into<String>) -> Self {
        self.ops.push(ScenarioOp::SendNow {
            from: ProcessId(from),
            to: ProcessId(to),
            label: label.into(),
        });
        self
    }

    /// Append a `Broadcast` op.
    pub fn broadcast(mut self, from: u32, label: impl Into<String>) -> Self {
        self.ops.push(ScenarioOp::Broadcast {
            from: ProcessId(from),
            label: label.into(),
        });
        self
    }

    /// Append a `Deliver` op.
    pub fn deliver(mut self, label: impl Into<String>, to: u32) -> Self {
        self.ops.push(ScenarioOp::Deliver {
            label: label.into(),
            to: ProcessId(to),
        });
        self
    }

    /// Append a `DeliverAll` op.
    pub fn deliver_all(mut self) -> Self {
        self.ops.push(ScenarioOp::DeliverAll);
        self
    }

    /// The canonical 3-process out-of-order scenario.
    ///
    /// P0 broadcasts m1; P1 delivers its copy and sends m3 to P2; P2 sees
    /// m3 before its copy of m1. Under the full causal check m3 buffers,
    /// and delivering m1 must cascade m3 out of the buffer.
    pub fn out_of_order_demo() -> Self {
        Scenario::new()
            .broadcast(0, "m1")
            .deliver("m1", 1)
            .send(1, 2, "m3")
            .deliver("m3", 2)
            .deliver("m1", 2)
    }

    /// A seeded random broadcast workload over `num_processes` processes.
    ///
    /// Every message is a broadcast, so under the full causal check every
    /// copy is eventually deliverable no matter how deliveries are ordered.
    /// Each broadcast is followed by a random subset of pending deliveries;
    /// the remainder is delivered in shuffled order at the end. The op list
    /// is a pure function of the seed.
    pub fn random_broadcasts(seed: u64, num_processes: u32, num_messages: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut scenario = Scenario::new();
        // Copies not yet delivered, as (label, receiver).
        let mut in_flight: Vec<(String, u32)> = Vec::new();

        for i in 0..num_messages {
            let from = rng.gen_range(0..num_processes);
            let label = format!("b{i}");
            scenario = scenario.broadcast(from, &label);
            for to in 0..num_processes {
                if to != from {
                    in_flight.push((label.clone(), to));
                }
            }

            // Deliver a random handful now, in random order.
            let deliver_now = rng.gen_range(0..=in_flight.len());
            in_flight.shuffle(&mut rng);
            for (label, to) in in_flight.drain(..deliver_now) {
                scenario = scenario.deliver(label, to);
            }
        }

        in_flight.shuffle(&mut rng);
        for (label, to) in in_flight {
            scenario = scenario.deliver(label, to);
        }
        scenario
    }
}
