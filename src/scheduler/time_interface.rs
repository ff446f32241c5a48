//! Wrapping microsecond timestamps and the clock seam used by the ramps.

/// A free-running 32-bit microsecond counter value.
///
/// The counter wraps roughly every 71.6 minutes, so timestamps are only ever
/// compared through [`Micros::wrapping_since`], which stays correct across a
/// wrap as long as the two readings are less than one full period apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Micros(pub u32);

impl Micros {
    pub const fn new(us: u32) -> Self {
        Self(us)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Microseconds elapsed from `earlier` to `self`, modulo 2³².
    pub const fn wrapping_since(self, earlier: Micros) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    pub const fn wrapping_add(self, us: u32) -> Micros {
        Micros(self.0.wrapping_add(us))
    }
}

/// Clock used by the blocking run-to-completion helpers.
///
/// `tick()` never reads a clock itself; only the layers above it do.
pub trait TimeInterface {
    fn now_micros(&self) -> Micros;
    /// Block for at least `us` microseconds.
    fn delay_micros(&self, us: u32);
}

impl<T: TimeInterface + ?Sized> TimeInterface for &T {
    fn now_micros(&self) -> Micros {
        (**self).now_micros()
    }

    fn delay_micros(&self, us: u32) {
        (**self).delay_micros(us)
    }
}
