//! Four-phase full-step commutation.

use super::{CoilDriver, CoilPins};

/// Coil levels for each phase, IN1..IN4. Two adjacent coils are high in
/// every phase; walking the table forwards or backwards turns the rotor.
pub const PHASE_PATTERNS: [[bool; 4]; 4] = [
    [false, false, true, true],
    [false, true, true, false],
    [true, true, false, false],
    [true, false, false, true],
];

/// Index into [`PHASE_PATTERNS`], always in `0..4`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoilPhase(u8);

impl CoilPhase {
    pub fn new(phase: u8) -> Self {
        Self(phase % 4)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Phase after one step in `direction` (+1 or -1). The sequence runs
    /// backwards for a positive step, matching the motor wiring.
    pub fn advance(self, direction: i8) -> Self {
        let next = (i16::from(self.0) - i16::from(direction)).rem_euclid(4);
        Self(next as u8)
    }

    pub fn pattern(self) -> [bool; 4] {
        PHASE_PATTERNS[usize::from(self.0)]
    }
}

/// Coil driver for a unipolar stepper wired to four output pins.
#[derive(Debug)]
pub struct UnipolarCoils<P> {
    pins: P,
    enabled: bool,
}

impl<P: CoilPins> UnipolarCoils<P> {
    /// Takes ownership of the pins and drives them low.
    pub fn new(mut pins: P) -> Self {
        pins.write([false; 4]);
        Self { pins, enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }
}

impl<P: CoilPins> CoilDriver for UnipolarCoils<P> {
    fn set_coil_pattern(&mut self, phase: CoilPhase) {
        self.enabled = true;
        self.pins.write(phase.pattern());
    }

    fn disable_motor(&mut self) {
        self.enabled = false;
        self.pins.write([false; 4]);
    }
}

/// Pins for hosts without GPIO: every write becomes a `trace!` event.
#[derive(Debug, Clone)]
pub struct TracingPins {
    motor: &'static str,
}

impl TracingPins {
    pub fn new(motor: &'static str) -> Self {
        Self { motor }
    }
}

impl CoilPins for TracingPins {
    fn write(&mut self, levels: [bool; 4]) {
        tracing::trace!(motor = self.motor, ?levels, "coil write");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LastWrite([bool; 4]);

    impl CoilPins for LastWrite {
        fn write(&mut self, levels: [bool; 4]) {
            self.0 = levels;
        }
    }

    #[test]
    fn phase_wraps_in_both_directions() {
        let p = CoilPhase::new(0);
        assert_eq!(p.advance(1).index(), 3);
        assert_eq!(p.advance(-1).index(), 1);
        assert_eq!(CoilPhase::new(3).advance(-1).index(), 0);
    }

    #[test]
    fn every_pattern_energizes_two_coils() {
        for pattern in PHASE_PATTERNS {
            assert_eq!(pattern.iter().filter(|on| **on).count(), 2);
        }
    }

    #[test]
    fn disable_drives_all_outputs_low() {
        let mut coils = UnipolarCoils::new(LastWrite([true; 4]));
        assert_eq!(coils.pins().0, [false; 4]);
        coils.set_coil_pattern(CoilPhase::new(2));
        assert!(coils.is_enabled());
        assert_eq!(coils.pins().0, [true, true, false, false]);
        coils.disable_motor();
        assert!(!coils.is_enabled());
        assert_eq!(coils.pins().0, [false; 4]);
    }
}
