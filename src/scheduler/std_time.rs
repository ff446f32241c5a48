use std::time::{Duration, Instant};

use super::time_interface::{Micros, TimeInterface};

/// Wall-clock time base backed by `std::time::Instant`.
///
/// Delays spin instead of sleeping: step periods are tens to thousands of
/// microseconds, well below the scheduler's sleep granularity.
#[derive(Debug)]
pub struct StdClock {
    epoch: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeInterface for StdClock {
    fn now_micros(&self) -> Micros {
        // Truncation to 32 bits is the counter wrap.
        Micros(self.epoch.elapsed().as_micros() as u32)
    }

    fn delay_micros(&self, us: u32) {
        let start = Instant::now();
        let wait = Duration::from_micros(u64::from(us));
        while start.elapsed() < wait {
            std::hint::spin_loop();
        }
    }
}
