// src/motion/mod.rs - Wall plotter motion core
pub mod arc;
pub mod controller;
pub mod kinematics;
pub mod machine;
pub mod ramp;
pub mod segment;

pub use arc::{ArcPlan, ArcSubdivider, center_offset_from_radius};
pub use controller::{MotionRequest, Plotter, PlotterStatus};
pub use kinematics::{CableKinematics, Kinematics};
pub use machine::{MachineState, PenState, Point};
pub use ramp::{AxisRamp, AxisState, TickOutcome, run_axes_to_completion};
pub use segment::{SegmentMover, SegmentReport};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MotionError {
    #[error("Invalid arc: {0}")]
    InvalidArc(String),
    #[error("Target ({x:.3}, {y:.3}) is outside the reachable area")]
    Unreachable { x: f64, y: f64 },
    #[error("Kinematics error: {0}")]
    Kinematics(String),
}
