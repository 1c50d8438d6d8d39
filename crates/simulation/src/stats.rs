//! Run statistics.

use std::fmt;

/// Counters accumulated over one simulation run.
///
/// `receives_delivered` counts receive calls whose head message delivered
/// immediately; messages released later by a cascade show up in
/// `total_delivered` (which sums every process's delivered log) but not
/// there. `still_pending` is the diagnosable permanent-buffering signal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimulationStats {
    /// Send events (a broadcast counts once).
    pub sends: usize,
    /// Message copies routed into a receiver.
    pub receives: usize,
    /// Receive calls that delivered immediately.
    pub receives_delivered: usize,
    /// Receive calls that buffered.
    pub receives_buffered: usize,
    /// Receive calls that were duplicate no-ops.
    pub receives_duplicate: usize,
    /// Sum of delivered-log lengths across all processes.
    pub total_delivered: usize,
    /// Message copies still in pending buffers at the end of the run.
    pub still_pending: usize,
}

impl SimulationStats {
    /// Deliveries released by buffer drains rather than directly by their
    /// own receive call.
    pub fn cascaded(&self) -> usize {
        self.total_delivered - self.receives_delivered
    }
}

impl fmt::Display for SimulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sends={} receives={} delivered={} (direct={}, cascaded={}) buffered={} duplicates={} still_pending={}",
            self.sends,
            self.receives,
            self.total_delivered,
            self.receives_delivered,
            self.cascaded(),
            self.receives_buffered,
            self.receives_duplicate,
            self.still_pending,
        )
    }
}
