//! Front-end helpers for the `causalsim` binary.
//!
//! The core engine knows nothing about presentation; this crate drives it
//! with scripted or seeded scenarios and turns the recorded events into
//! printable transcripts. Pacing, colors, and any other rendering concerns
//! stop here and never reach the engine.

use causalsim_core::{DeliveryPolicy, EventRecorder, ObservedEvent};
use causalsim_simulation::{Scenario, Simulation, SimulationError, SimulationStats};

/// Configuration for a randomized simulation run.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Delivery-condition algorithm for the run.
    pub policy: DeliveryPolicy,

    /// Number of processes in the group.
    pub num_processes: u32,

    /// Number of broadcast messages to generate.
    pub num_messages: usize,

    /// Random seed for deterministic scenario generation.
    pub seed: u64,
}

impl SimulatorConfig {
    /// Create a configuration with default workload size and seed.
    pub fn new(policy: DeliveryPolicy, num_processes: u32) -> Self {
        Self {
            policy,
            num_processes,
            num_messages: 20,
            seed: 12345,
        }
    }

    /// Set the number of messages.
    pub fn with_messages(mut self, num_messages: usize) -> Self {
        self.num_messages = num_messages;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Result of a driven run: the recorded transcript plus final counters.
#[derive(Debug)]
pub struct RunReport {
    /// Every observed event, in firing order.
    pub events: Vec<ObservedEvent>,
    /// Final run statistics.
    pub stats: SimulationStats,
}

impl RunReport {
    /// Render one transcript line per event.
    pub fn transcript(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|event| match event {
                ObservedEvent::Send {
                    sender,
                    receiver,
                    message,
                } => format!("{sender} SENT {message} to {receiver}"),
                ObservedEvent::Delivered {
                    process,
                    message,
                    clock,
                } => format!("{process} DELIVERED {message}, clock {clock}"),
                ObservedEvent::Buffered { process, message } => {
                    format!("{process} BUFFERED {message} (missing dependencies)")
                }
            })
            .collect()
    }
}

/// Run the canonical 3-process out-of-order demo under the given policy.
pub fn run_demo(policy: DeliveryPolicy) -> Result<RunReport, SimulationError> {
    run_scenario(policy, 3, &Scenario::out_of_order_demo())
}

/// Run a seeded random broadcast workload.
pub fn run_random(config: &SimulatorConfig) -> Result<RunReport, SimulationError> {
    let scenario =
        Scenario::random_broadcasts(config.seed, config.num_processes, config.num_messages);
    run_scenario(config.policy, config.num_processes as usize, &scenario)
}

fn run_scenario(
    policy: DeliveryPolicy,
    num_processes: usize,
    scenario: &Scenario,
) -> Result<RunReport, SimulationError> {
    let mut sim = Simulation::new(policy, num_processes, EventRecorder::new());
    sim.run(scenario)?;
    let stats = sim.stats();
    Ok(RunReport {
        events: sim.observer().events().to_vec(),
        stats,
    })
}
