//! Per-axis trapezoidal step-timing generator.
//!
//! Each step's period is derived from the previous one with the first-order
//! recurrence from Aryeh Eiderman's "Real Time Stepper Motor Linear Ramping
//! Just By Addition and Multiplication":
//!
//! ```text
//! p' = p * (1 - a * p²)      a in steps/µs², negated while decelerating
//! ```
//!
//! The approximation is authoritative. It is never corrected against a
//! closed-form profile; the only correction is a floor at the cruise period.
//!
//! [`AxisRamp::tick`] is the non-blocking core and does O(1) work per call.
//! The blocking helpers ([`AxisRamp::run_to_completion`],
//! [`run_axes_to_completion`]) are layered on top and are the only code that
//! touches a clock.

use crate::hardware::{CoilDriver, CoilPhase};
use crate::scheduler::{Micros, TimeInterface};

const US_PER_SECOND: f64 = 1_000_000.0;
const US2_PER_SECOND2: f64 = 1e12;

/// Result of polling an axis once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not yet time for the next step.
    Continue,
    /// One step was issued to the coil driver; the move is still running.
    StepEmitted,
    /// The axis is at its target.
    Complete,
}

/// Position, target and ramp bookkeeping of one motor.
///
/// Speed, acceleration and position origin may only be changed while the
/// axis is idle. Changing them mid-move is not detected and leaves the ramp
/// in an unspecified state.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisState {
    pub current_position_steps: i64,
    pub target_position_steps: i64,
    pub desired_speed_steps_per_sec: f64,
    pub acceleration_steps_per_sec2: f64,
    /// +1 or -1 for the move in flight.
    pub direction: i8,
    pub deceleration_distance_steps: u64,
    /// Period of the first step of a move, µs.
    pub initial_step_period_us: f64,
    /// Period at the desired speed, µs. The ramp never runs faster.
    pub cruise_step_period_us: f64,
    /// Period the ramp will wait before the next step, µs.
    pub ramp_phase_period_us: f64,
    /// Period of the last emitted step; 0 when idle.
    pub current_step_period_us: f64,
    pub last_step_timestamp_us: Micros,
    /// +1 while accelerating, -1 once deceleration has begun.
    pub acceleration_sign: i8,
    /// Acceleration latched at `begin_move`, steps/µs².
    pub ramp_acceleration_per_us2: f64,
    start_pending: bool,
    phase: CoilPhase,
}

impl Default for AxisState {
    fn default() -> Self {
        Self {
            current_position_steps: 0,
            target_position_steps: 0,
            desired_speed_steps_per_sec: 2048.0 / 8.0,
            acceleration_steps_per_sec2: 2048.0 / 4.0,
            direction: 1,
            deceleration_distance_steps: 0,
            initial_step_period_us: 0.0,
            cruise_step_period_us: 0.0,
            ramp_phase_period_us: 0.0,
            current_step_period_us: 0.0,
            last_step_timestamp_us: Micros::default(),
            acceleration_sign: 1,
            ramp_acceleration_per_us2: 0.0,
            start_pending: false,
            phase: CoilPhase::default(),
        }
    }
}

impl AxisState {
    fn distance_to_target(&self) -> u64 {
        (self.target_position_steps - self.current_position_steps).unsigned_abs()
    }
}

/// One motor: its ramp state plus the coil driver it steps.
#[derive(Debug)]
pub struct AxisRamp<D> {
    state: AxisState,
    driver: D,
}

impl<D: CoilDriver> AxisRamp<D> {
    pub fn new(driver: D) -> Self {
        Self {
            state: AxisState::default(),
            driver,
        }
    }

    pub fn state(&self) -> &AxisState {
        &self.state
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Redefine the current position without moving. Idle only.
    pub fn set_current_position(&mut self, steps: i64) {
        self.state.current_position_steps = steps;
        self.state.target_position_steps = steps;
    }

    pub fn current_position(&self) -> i64 {
        self.state.current_position_steps
    }

    pub fn target_position(&self) -> i64 {
        self.state.target_position_steps
    }

    /// Cruise speed in steps/second. Idle only.
    pub fn set_speed(&mut self, steps_per_second: f64) {
        self.state.desired_speed_steps_per_sec = steps_per_second;
    }

    /// Ramp acceleration in steps/second². Idle only.
    pub fn set_acceleration(&mut self, steps_per_second2: f64) {
        self.state.acceleration_steps_per_sec2 = steps_per_second2;
    }

    pub fn deceleration_distance(&self) -> u64 {
        self.state.deceleration_distance_steps
    }

    pub fn is_motion_complete(&self) -> bool {
        self.state.current_position_steps == self.state.target_position_steps
    }

    /// Prepare a move to an absolute position. Nothing moves until `tick`.
    pub fn begin_move(&mut self, target_steps: i64) {
        let s = &mut self.state;
        s.target_position_steps = target_steps;

        let speed = s.desired_speed_steps_per_sec;
        let accel = s.acceleration_steps_per_sec2;
        s.initial_step_period_us = US_PER_SECOND / (2.0 * accel).sqrt();
        s.cruise_step_period_us = US_PER_SECOND / speed;
        s.ramp_acceleration_per_us2 = accel / US2_PER_SECOND2;
        s.deceleration_distance_steps = ((speed * speed) / (2.0 * accel)).round() as u64;

        let travel = target_steps - s.current_position_steps;
        s.direction = if travel < 0 { -1 } else { 1 };
        let travel = travel.unsigned_abs();

        // Too short to reach cruise speed: triangular profile.
        if travel <= s.deceleration_distance_steps.saturating_mul(2) {
            s.deceleration_distance_steps = travel / 2;
        }

        s.ramp_phase_period_us = s.initial_step_period_us;
        s.acceleration_sign = 1;
        s.start_pending = true;
    }

    /// Prepare a move relative to the current position.
    pub fn setup_relative_move(&mut self, delta_steps: i64) {
        self.begin_move(self.state.current_position_steps + delta_steps);
    }

    /// Poll the axis. Emits at most one step.
    pub fn tick(&mut self, now: Micros) -> TickOutcome {
        if self.is_motion_complete() {
            return TickOutcome::Complete;
        }

        if self.state.start_pending {
            self.state.last_step_timestamp_us = now;
            self.state.start_pending = false;
            return TickOutcome::Continue;
        }

        let elapsed = now.wrapping_since(self.state.last_step_timestamp_us);
        if elapsed < self.state.ramp_phase_period_us as u32 {
            return TickOutcome::Continue;
        }

        if self.state.distance_to_target() == self.state.deceleration_distance_steps {
            self.state.acceleration_sign = -1;
        }

        self.emit_step();

        let s = &mut self.state;
        s.current_step_period_us = s.ramp_phase_period_us;

        let accel_per_us2 = f64::from(s.acceleration_sign) * s.ramp_acceleration_per_us2;
        let period = s.ramp_phase_period_us;
        let mut next = period * (1.0 - accel_per_us2 * period * period);
        if next < s.cruise_step_period_us {
            next = s.cruise_step_period_us;
        }
        s.ramp_phase_period_us = next;
        s.last_step_timestamp_us = now;

        if s.current_position_steps == s.target_position_steps {
            s.current_step_period_us = 0.0;
            TickOutcome::Complete
        } else {
            TickOutcome::StepEmitted
        }
    }

    fn emit_step(&mut self) {
        let s = &mut self.state;
        s.phase = s.phase.advance(s.direction);
        self.driver.set_coil_pattern(s.phase);
        s.current_position_steps += i64::from(s.direction);
    }

    /// Begin decelerating to a stop from wherever the move currently is.
    ///
    /// The target is pulled in to one deceleration distance ahead of the
    /// current position, so the next step sees "time to decelerate". A move
    /// already closer to its target than that is left untouched.
    pub fn request_stop(&mut self) {
        if self.is_motion_complete() {
            return;
        }
        let s = &mut self.state;
        let pull = s.deceleration_distance_steps.min(s.distance_to_target());
        s.target_position_steps = s.current_position_steps + i64::from(s.direction) * pull as i64;
        if s.target_position_steps == s.current_position_steps {
            s.current_step_period_us = 0.0;
        }
        tracing::debug!(target = s.target_position_steps, "axis stop requested");
    }

    /// Signed speed of the last emitted step in steps/second; 0 when idle.
    pub fn current_velocity(&self) -> f64 {
        let period = self.state.current_step_period_us;
        if period == 0.0 {
            0.0
        } else {
            f64::from(self.state.direction) * US_PER_SECOND / period
        }
    }

    /// Microseconds from `now` until the next step is due; 0 if overdue.
    pub fn micros_until_next_step(&self, now: Micros) -> u32 {
        if self.state.start_pending {
            return 0;
        }
        let due = self.state.ramp_phase_period_us as u32;
        due.saturating_sub(now.wrapping_since(self.state.last_step_timestamp_us))
    }

    /// Poll until the move completes, delaying on `clock` between steps.
    pub fn run_to_completion<T: TimeInterface + ?Sized>(&mut self, clock: &T) {
        loop {
            let now = clock.now_micros();
            match self.tick(now) {
                TickOutcome::Complete => return,
                TickOutcome::StepEmitted => {}
                TickOutcome::Continue => clock.delay_micros(self.micros_until_next_step(now).max(1)),
            }
        }
    }

    /// Blocking move to an absolute position.
    pub fn move_to_position<T: TimeInterface + ?Sized>(&mut self, target_steps: i64, clock: &T) {
        self.begin_move(target_steps);
        self.run_to_completion(clock);
    }

    /// Blocking move relative to the current position.
    pub fn move_relative<T: TimeInterface + ?Sized>(&mut self, delta_steps: i64, clock: &T) {
        self.setup_relative_move(delta_steps);
        self.run_to_completion(clock);
    }

    /// Release the coils. Any later step re-energizes them.
    pub fn disable(&mut self) {
        self.driver.disable_motor();
    }
}

/// Poll several prepared axes in turn until every one has completed.
///
/// This is how independent ramps share one control loop: each axis keeps its
/// own time base and only the shortest pending wait is slept.
pub fn run_axes_to_completion<D, T>(axes: &mut [AxisRamp<D>], clock: &T)
where
    D: CoilDriver,
    T: TimeInterface + ?Sized,
{
    loop {
        let now = clock.now_micros();
        let mut running = false;
        let mut wait = u32::MAX;
        for axis in axes.iter_mut() {
            match axis.tick(now) {
                TickOutcome::Complete => {}
                TickOutcome::StepEmitted => {
                    running = true;
                    wait = 0;
                }
                TickOutcome::Continue => {
                    running = true;
                    wait = wait.min(axis.micros_until_next_step(now));
                }
            }
        }
        if !running {
            return;
        }
        if wait > 0 {
            clock.delay_micros(wait);
        }
    }
}
