// src/hardware/mod.rs - Coil driver boundary for the two unipolar motors
pub mod coils;

pub use coils::{CoilPhase, TracingPins, UnipolarCoils, PHASE_PATTERNS};

/// Four raw coil outputs of one motor (IN1..IN4 on a ULN2003-style board).
///
/// Implementations must not block: `write` sits on the step timing path.
pub trait CoilPins {
    fn write(&mut self, levels: [bool; 4]);
}

/// What an axis ramp needs from its motor: energize one phase, or release.
pub trait CoilDriver {
    fn set_coil_pattern(&mut self, phase: CoilPhase);
    /// Drive every coil low. The next step re-energizes the motor.
    fn disable_motor(&mut self);
}

impl<P: CoilPins + ?Sized> CoilPins for Box<P> {
    fn write(&mut self, levels: [bool; 4]) {
        (**self).write(levels)
    }
}
