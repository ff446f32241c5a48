//! Shared machine position state.

use serde::Serialize;

/// A draw-surface coordinate in millimeters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Point at fraction `t` of the way from `self` to `other`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PenState {
    #[default]
    Up,
    Down,
}

/// Where the pen is and where it is going.
///
/// `current_steps` always equals the kinematic solve of `current_cartesian`
/// once a move has finished; both are written only when a segment completes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineState {
    pub current_cartesian: Point,
    pub destination_cartesian: Point,
    /// Last requested Z word; the pen lift itself is driven by `pen`.
    pub destination_z: f64,
    pub current_steps: [i64; 2],
    pub pen: PenState,
}

impl MachineState {
    /// State for a pen resting at `home`, whose motor counts are `steps`.
    pub fn homed(home: Point, steps: [i64; 2]) -> Self {
        Self {
            current_cartesian: home,
            destination_cartesian: home,
            destination_z: 0.0,
            current_steps: steps,
            pen: PenState::Up,
        }
    }

    pub(crate) fn commit(&mut self, position: Point, steps: [i64; 2]) {
        self.current_cartesian = position;
        self.current_steps = steps;
    }
}
