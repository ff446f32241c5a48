//! Straight-line moves for the two cable motors.
//!
//! A segment is solved to absolute step targets once, then the step deltas
//! are distributed over the motors. In `Sequenced` mode the larger delta
//! (the major axis) is walked one blocking single-step move at a time, and
//! the minor axis is stepped in proportion with an integer error term.

use std::ops::AddAssign;

use crate::config::{Config, SegmentMode};
use crate::hardware::CoilDriver;
use crate::motion::kinematics::{CableKinematics, Kinematics};
use crate::motion::machine::{MachineState, Point};
use crate::motion::ramp::{AxisRamp, run_axes_to_completion};
use crate::scheduler::TimeInterface;

/// Steps issued to each motor, `[m1, m2]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentReport {
    pub steps: [u64; 2],
}

impl AddAssign for SegmentReport {
    fn add_assign(&mut self, rhs: Self) {
        self.steps[0] += rhs.steps[0];
        self.steps[1] += rhs.steps[1];
    }
}

/// Integer proportional stepping of a minor axis against a major one.
///
/// Yields once per major step; the item is `true` when the minor axis must
/// step too. Exactly `minor` of the `major` items are `true`, and the
/// outstanding error always stays below `major`.
#[derive(Debug, Clone)]
pub struct Interleave {
    major: u64,
    minor: u64,
    remaining: u64,
    error: u64,
}

impl Interleave {
    pub fn new(major: u64, minor: u64) -> Self {
        debug_assert!(minor <= major);
        Self {
            major,
            minor,
            remaining: major,
            error: 0,
        }
    }

    /// Accumulated minor-axis debt after the last yielded step.
    pub fn error(&self) -> u64 {
        self.error
    }
}

impl Iterator for Interleave {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.error += self.minor;
        if self.error >= self.major {
            self.error -= self.major;
            Some(true)
        } else {
            Some(false)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

/// Drives both motors along straight segments and keeps [`MachineState`]
/// in step with them.
#[derive(Debug)]
pub struct SegmentMover<D> {
    motors: [AxisRamp<D>; 2],
    kinematics: CableKinematics,
    invert: [bool; 2],
    line_delay_us: u32,
    mode: SegmentMode,
}

impl<D: CoilDriver> SegmentMover<D> {
    pub fn new(mut motors: [AxisRamp<D>; 2], kinematics: CableKinematics, config: &Config) -> Self {
        for motor in motors.iter_mut() {
            motor.set_speed(config.motors.speed);
            motor.set_acceleration(config.motors.acceleration);
        }
        Self {
            motors,
            kinematics,
            invert: [config.motors.invert_m1, config.motors.invert_m2],
            line_delay_us: config.motion.line_delay_us,
            mode: config.motion.segment_mode,
        }
    }

    pub fn kinematics(&self) -> &CableKinematics {
        &self.kinematics
    }

    pub fn motors(&self) -> &[AxisRamp<D>; 2] {
        &self.motors
    }

    pub fn motors_mut(&mut self) -> &mut [AxisRamp<D>; 2] {
        &mut self.motors
    }

    pub fn mode(&self) -> SegmentMode {
        self.mode
    }

    pub fn disable_motors(&mut self) {
        for motor in self.motors.iter_mut() {
            motor.disable();
        }
    }

    /// Physical step direction of motor `index` for a signed kinematic delta.
    fn motor_direction(&self, index: usize, delta: i64) -> i64 {
        let sign = if delta > 0 { 1 } else { -1 };
        if self.invert[index] { -sign } else { sign }
    }

    /// Move straight to `target`, blocking until every step is issued.
    ///
    /// The machine state is set to the exact solved target afterwards, never
    /// accumulated from the individual steps.
    pub fn move_to<T>(&mut self, state: &mut MachineState, clock: &T, target: Point) -> SegmentReport
    where
        T: TimeInterface + ?Sized,
    {
        let targets = self.kinematics.cartesian_to_motors(target);
        let deltas = [
            targets[0] - state.current_steps[0],
            targets[1] - state.current_steps[1],
        ];

        let report = match self.mode {
            SegmentMode::Sequenced => self.step_interleaved(deltas, clock),
            SegmentMode::Concurrent => self.step_concurrently(deltas, clock),
        };

        state.commit(target, targets);
        report
    }

    fn step_interleaved<T>(&mut self, deltas: [i64; 2], clock: &T) -> SegmentReport
    where
        T: TimeInterface + ?Sized,
    {
        let counts = [deltas[0].unsigned_abs(), deltas[1].unsigned_abs()];
        let dirs = [self.motor_direction(0, deltas[0]), self.motor_direction(1, deltas[1])];
        let (major, minor) = if counts[0] > counts[1] { (0, 1) } else { (1, 0) };

        let mut report = SegmentReport::default();
        for minor_steps in Interleave::new(counts[major], counts[minor]) {
            self.motors[major].move_relative(dirs[major], clock);
            report.steps[major] += 1;
            if minor_steps {
                self.motors[minor].move_relative(dirs[minor], clock);
                report.steps[minor] += 1;
            }
            clock.delay_micros(self.line_delay_us);
        }
        report
    }

    fn step_concurrently<T>(&mut self, deltas: [i64; 2], clock: &T) -> SegmentReport
    where
        T: TimeInterface + ?Sized,
    {
        let counts = [deltas[0].unsigned_abs(), deltas[1].unsigned_abs()];
        for (index, count) in counts.iter().enumerate() {
            if *count > 0 {
                let dir = self.motor_direction(index, deltas[index]);
                self.motors[index].setup_relative_move(dir * *count as i64);
            }
        }
        run_axes_to_completion(&mut self.motors, clock);
        SegmentReport { steps: counts }
    }

    /// Move to `destination` through waypoints spaced one step resolution
    /// apart, finishing with an exact move onto `destination`.
    pub fn move_along_path<T>(&mut self, state: &mut MachineState, clock: &T, destination: Point) -> SegmentReport
    where
        T: TimeInterface + ?Sized,
    {
        let start = state.current_cartesian;
        let distance = start.distance_to(destination);
        let resolution = self.kinematics.step_resolution();

        if distance <= resolution {
            return self.move_to(state, clock, destination);
        }

        let waypoints = (distance / resolution).floor() as u64;
        tracing::debug!(
            from = ?start,
            to = ?destination,
            distance,
            waypoints,
            "line"
        );

        let mut report = SegmentReport::default();
        for i in 1..=waypoints {
            let t = i as f64 / waypoints as f64;
            report += self.move_to(state, clock, start.lerp(destination, t));
        }
        report += self.move_to(state, clock, destination);
        report
    }
}
