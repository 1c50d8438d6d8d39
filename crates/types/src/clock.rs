//! Logical clocks for causal ordering.
//!
//! Two representations are supported:
//!
//! - [`VectorClock`]: N entries, index i = process i's event count as known
//!   by the clock's owner.
//! - [`MatrixClock`]: N×N grid, `matrix[p][q]` = process p's belief about
//!   process q's own event count. The diagonal `matrix[p][p]` is process p's
//!   authoritative count.
//!
//! Both merge by component-wise maximum, which makes merge commutative and
//! idempotent: merging the same snapshot twice is equivalent to merging it
//! once. Entries never decrease.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProcessId;

/// Partial-order relationship between two clocks of the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockOrdering {
    /// All entries equal.
    Equal,
    /// Self is causally before other (self <= other, not equal).
    Before,
    /// Self is causally after other (self >= other, not equal).
    After,
    /// Neither dominates: concurrent.
    Concurrent,
}

/// Which clock representation a policy or message uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockKind {
    /// Flat per-process vector.
    Vector,
    /// N×N belief matrix.
    Matrix,
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockKind::Vector => write!(f, "vector"),
            ClockKind::Matrix => write!(f, "matrix"),
        }
    }
}

/// Vector clock: one event counter per process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    entries: Vec<u64>,
}

impl VectorClock {
    /// Create a zeroed clock for `num_processes` processes.
    pub fn new(num_processes: usize) -> Self {
        Self {
            entries: vec![0; num_processes],
        }
    }

    /// Number of processes this clock tracks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the clock tracks zero processes (degenerate).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the entry for a process.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range for this clock.
    pub fn get(&self, id: ProcessId) -> u64 {
        self.entries[id.index()]
    }

    /// Increment the entry for a process by one.
    ///
    /// Used only by the clock's owner, only on a local send event.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range for this clock.
    pub fn increment(&mut self, id: ProcessId) {
        self.entries[id.index()] += 1;
    }

    /// Merge another clock into this one by component-wise maximum.
    ///
    /// # Panics
    ///
    /// Panics if the two clocks have different dimensions. Callers validate
    /// dimensions before merging (see `Process::receive`).
    pub fn merge(&mut self, other: &VectorClock) {
        assert_eq!(
            self.entries.len(),
            other.entries.len(),
            "cannot merge vector clocks of different dimension"
        );
        for (local, incoming) in self.entries.iter_mut().zip(&other.entries) {
            *local = (*local).max(*incoming);
        }
    }

    /// Compare two clocks under the happens-before partial order.
    pub fn compare(&self, other: &VectorClock) -> ClockOrdering {
        let mut self_lte = true;
        let mut other_lte = true;
        for (s, o) in self.entries.iter().zip(&other.entries) {
            if s > o {
                self_lte = false;
            }
            if o > s {
                other_lte = false;
            }
        }
        match (self_lte, other_lte) {
            (true, true) => ClockOrdering::Equal,
            (true, false) => ClockOrdering::Before,
            (false, true) => ClockOrdering::After,
            (false, false) => ClockOrdering::Concurrent,
        }
    }

    /// View the raw entries.
    pub fn entries(&self) -> &[u64] {
        &self.entries
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, e) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{e}")?;
        }
        write!(f, "]")
    }
}

/// Matrix clock: each process's belief about every process's event count.
///
/// Stored row-major: row p holds process p's counts as believed by the
/// clock's owner. Off-diagonal cells only ever move via merges from received
/// snapshots; the owner's diagonal cell is its authoritative event count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixClock {
    dimension: usize,
    cells: Vec<u64>,
}

impl MatrixClock {
    /// Create a zeroed N×N clock.
    pub fn new(num_processes: usize) -> Self {
        Self {
            dimension: num_processes,
            cells: vec![0; num_processes * num_processes],
        }
    }

    /// Number of processes this clock tracks (N of the N×N grid).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get cell `(p, q)`: p's believed count for q.
    ///
    /// # Panics
    ///
    /// Panics if either id is out of range.
    pub fn get(&self, p: ProcessId, q: ProcessId) -> u64 {
        assert!(p.index() < self.dimension && q.index() < self.dimension);
        self.cells[p.index() * self.dimension + q.index()]
    }

    /// Get the diagonal entry for a process: its authoritative event count
    /// as known by this clock.
    pub fn diagonal(&self, p: ProcessId) -> u64 {
        self.get(p, p)
    }

    /// Increment a process's diagonal entry by one.
    ///
    /// Used by the clock's owner on every local event (send, and for matrix
    /// clocks also delivery).
    ///
    /// # Panics
    ///
    /// Panics if `p` is out of range.
    pub fn increment_diagonal(&mut self, p: ProcessId) {
        assert!(p.index() < self.dimension);
        self.cells[p.index() * self.dimension + p.index()] += 1;
    }

    /// Merge another clock into this one by cell-wise maximum.
    ///
    /// # Panics
    ///
    /// Panics if dimensions differ. Callers validate dimensions before
    /// merging (see `Process::receive`).
    pub fn merge(&mut self, other: &MatrixClock) {
        assert_eq!(
            self.dimension, other.dimension,
            "cannot merge matrix clocks of different dimension"
        );
        for (local, incoming) in self.cells.iter_mut().zip(&other.cells) {
            *local = (*local).max(*incoming);
        }
    }
}

impl fmt::Display for MatrixClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for row in 0..self.dimension {
            if row > 0 {
                write!(f, ";")?;
            }
            for col in 0..self.dimension {
                if col > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", self.cells[row * self.dimension + col])?;
            }
        }
        write!(f, "]")
    }
}

/// A logical clock of either representation.
///
/// A simulation run picks one representation (via its delivery policy) and
/// never mixes them; the tagged union lets `Process` and `Message` stay
/// policy-agnostic while `receive` rejects cross-kind messages up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clock {
    /// Vector clock.
    Vector(VectorClock),
    /// Matrix clock.
    Matrix(MatrixClock),
}

impl Clock {
    /// Which representation this clock uses.
    pub fn kind(&self) -> ClockKind {
        match self {
            Clock::Vector(_) => ClockKind::Vector,
            Clock::Matrix(_) => ClockKind::Matrix,
        }
    }

    /// Number of processes this clock tracks.
    pub fn dimension(&self) -> usize {
        match self {
            Clock::Vector(v) => v.len(),
            Clock::Matrix(m) => m.dimension(),
        }
    }

    /// The owner-authoritative event count for a process: the vector entry,
    /// or the matrix diagonal.
    pub fn own_count(&self, id: ProcessId) -> u64 {
        match self {
            Clock::Vector(v) => v.get(id),
            Clock::Matrix(m) => m.diagonal(id),
        }
    }

    /// Record a local event for `id`: bump the vector entry or the matrix
    /// diagonal by one.
    pub fn record_local_event(&mut self, id: ProcessId) {
        match self {
            Clock::Vector(v) => v.increment(id),
            Clock::Matrix(m) => m.increment_diagonal(id),
        }
    }

    /// Merge a same-kind clock into this one by component-wise maximum.
    ///
    /// # Panics
    ///
    /// Panics on kind or dimension mismatch. Callers validate both before
    /// merging (see `Process::receive`).
    pub fn merge(&mut self, other: &Clock) {
        match (self, other) {
            (Clock::Vector(l), Clock::Vector(o)) => l.merge(o),
            (Clock::Matrix(l), Clock::Matrix(o)) => l.merge(o),
            _ => panic!("cannot merge clocks of different kinds"),
        }
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clock::Vector(v) => v.fmt(f),
            Clock::Matrix(m) => m.fmt(f),
        }
    }
}
