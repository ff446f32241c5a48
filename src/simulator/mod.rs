//! Virtual hardware for dry runs, tests and benchmarks.
pub mod sim_clock;

pub use sim_clock::SimClock;

use crate::hardware::CoilPins;

/// Coil pins that remember every write.
#[derive(Debug, Clone, Default)]
pub struct RecordingPins {
    writes: Vec<[bool; 4]>,
}

impl RecordingPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> &[[bool; 4]] {
        &self.writes
    }

    /// Writes that energized coils, i.e. steps. Power-down writes are skipped.
    pub fn step_count(&self) -> usize {
        self.writes.iter().filter(|w| w.iter().any(|on| *on)).count()
    }

    pub fn last(&self) -> Option<[bool; 4]> {
        self.writes.last().copied()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

impl CoilPins for RecordingPins {
    fn write(&mut self, levels: [bool; 4]) {
        self.writes.push(levels);
    }
}
