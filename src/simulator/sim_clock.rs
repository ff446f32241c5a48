use std::cell::Cell;
use std::time::Duration;

use crate::scheduler::{Micros, TimeInterface};

/// Simulation clock: time only moves when someone delays on it.
#[derive(Debug, Default)]
pub struct SimClock {
    now: Cell<Micros>,
    elapsed_us: Cell<u64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the counter at an arbitrary reading, e.g. just before a wrap.
    pub fn starting_at(start: Micros) -> Self {
        Self {
            now: Cell::new(start),
            elapsed_us: Cell::new(0),
        }
    }

    pub fn advance(&self, us: u32) {
        self.now.set(self.now.get().wrapping_add(us));
        self.elapsed_us.set(self.elapsed_us.get() + u64::from(us));
    }

    /// Total simulated time, unaffected by counter wraps.
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.elapsed_us.get())
    }
}

impl TimeInterface for SimClock {
    fn now_micros(&self) -> Micros {
        self.now.get()
    }

    fn delay_micros(&self, us: u32) {
        self.advance(us);
    }
}
