//! The plotter: owns machine state, both motors, the clock, and the
//! segment/arc movers. Everything the command front end can ask for goes
//! through [`Plotter::execute`].

use serde::Serialize;

use crate::config::Config;
use crate::hardware::CoilDriver;
use crate::motion::MotionError;
use crate::motion::arc::ArcSubdivider;
use crate::motion::kinematics::{CableKinematics, Kinematics};
use crate::motion::machine::{MachineState, PenState, Point};
use crate::motion::ramp::AxisRamp;
use crate::motion::segment::{SegmentMover, SegmentReport};
use crate::scheduler::TimeInterface;

/// A motion request from the command front end. Omitted axes keep their
/// previous destination value.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionRequest {
    LinearMove {
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
    },
    ArcMove {
        x: Option<f64>,
        y: Option<f64>,
        /// Center offset from the current position.
        i: f64,
        j: f64,
        clockwise: bool,
    },
    Dwell {
        millis: u64,
    },
    Pen(PenState),
}

/// Snapshot for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotterStatus {
    pub cartesian: Point,
    pub steps: [i64; 2],
    pub pen: PenState,
    pub motor_velocity: [f64; 2],
    pub total_steps: [u64; 2],
}

pub struct Plotter<D, T> {
    mover: SegmentMover<D>,
    arcs: ArcSubdivider,
    state: MachineState,
    clock: T,
    total: SegmentReport,
}

impl<D: CoilDriver, T: TimeInterface> Plotter<D, T> {
    /// Build the plotter and home it: the pen is assumed to rest at the
    /// origin, so the step counters are seeded from the origin's solve.
    pub fn new(config: &Config, drivers: [D; 2], clock: T) -> Self {
        let kinematics = CableKinematics::new(&config.machine);
        let motors = drivers.map(AxisRamp::new);
        let mut plotter = Self {
            mover: SegmentMover::new(motors, kinematics, config),
            arcs: ArcSubdivider::new(&config.motion),
            state: MachineState::default(),
            clock,
            total: SegmentReport::default(),
        };
        plotter.home();
        plotter
    }

    /// Re-seed the position from the origin. Nothing moves.
    pub fn home(&mut self) {
        let origin = Point::default();
        let steps = self.mover.kinematics().cartesian_to_motors(origin);
        self.state = MachineState::homed(origin, steps);
        tracing::info!(m1 = steps[0], m2 = steps[1], "homed at origin");
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn clock(&self) -> &T {
        &self.clock
    }

    pub fn motors(&self) -> &[AxisRamp<D>; 2] {
        self.mover.motors()
    }

    pub fn kinematics(&self) -> &CableKinematics {
        self.mover.kinematics()
    }

    /// Steps issued since construction, per motor.
    pub fn total_steps(&self) -> [u64; 2] {
        self.total.steps
    }

    pub fn status(&self) -> PlotterStatus {
        let motors = self.mover.motors();
        PlotterStatus {
            cartesian: self.state.current_cartesian,
            steps: self.state.current_steps,
            pen: self.state.pen,
            motor_velocity: [motors[0].current_velocity(), motors[1].current_velocity()],
            total_steps: self.total.steps,
        }
    }

    /// Straight line to `destination`.
    pub fn move_along_path(&mut self, destination: Point) -> SegmentReport {
        self.state.destination_cartesian = destination;
        let report = self.mover.move_along_path(&mut self.state, &self.clock, destination);
        self.total += report;
        report
    }

    /// Arc to `destination` around `current + center_offset`.
    pub fn move_along_arc(&mut self, destination: Point, center_offset: [f64; 2], clockwise: bool) -> SegmentReport {
        self.state.destination_cartesian = destination;
        let report = self.arcs.move_along_arc(
            &mut self.mover,
            &mut self.state,
            &self.clock,
            destination,
            center_offset,
            clockwise,
        );
        self.total += report;
        report
    }

    pub fn execute(&mut self, request: MotionRequest) -> Result<SegmentReport, MotionError> {
        match request {
            MotionRequest::LinearMove { x, y, z } => {
                let destination = self.resolve_destination(x, y)?;
                if let Some(z) = z {
                    self.state.destination_z = z;
                }
                Ok(self.move_along_path(destination))
            }
            MotionRequest::ArcMove { x, y, i, j, clockwise } => {
                let destination = self.resolve_destination(x, y)?;
                Ok(self.move_along_arc(destination, [i, j], clockwise))
            }
            MotionRequest::Dwell { millis } => {
                self.dwell(millis);
                Ok(SegmentReport::default())
            }
            MotionRequest::Pen(pen) => {
                self.set_pen(pen);
                Ok(SegmentReport::default())
            }
        }
    }

    fn resolve_destination(&self, x: Option<f64>, y: Option<f64>) -> Result<Point, MotionError> {
        let previous = self.state.destination_cartesian;
        let destination = Point::new(x.unwrap_or(previous.x), y.unwrap_or(previous.y));
        if !self.mover.kinematics().is_valid_position(destination) {
            return Err(MotionError::Unreachable {
                x: destination.x,
                y: destination.y,
            });
        }
        Ok(destination)
    }

    pub fn dwell(&self, millis: u64) {
        tracing::debug!(millis, "dwell");
        let mut remaining_us = millis.saturating_mul(1000);
        while remaining_us > 0 {
            let chunk = remaining_us.min(u64::from(u32::MAX));
            self.clock.delay_micros(chunk as u32);
            remaining_us -= chunk;
        }
    }

    pub fn set_pen(&mut self, pen: PenState) {
        if self.state.pen != pen {
            tracing::debug!(?pen, "pen");
        }
        self.state.pen = pen;
    }

    /// Release both motors' coils.
    pub fn disable_motors(&mut self) {
        self.mover.disable_motors();
        tracing::info!("motors disabled");
    }
}
