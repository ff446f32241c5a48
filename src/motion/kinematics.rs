// src/motion/kinematics.rs - Two-cable (V-plotter) kinematics
use crate::config::MachineConfig;
use crate::motion::MotionError;
use crate::motion::machine::Point;

/// Mapping between draw-surface coordinates and absolute motor step counts.
pub trait Kinematics {
    /// Convert a Cartesian point to step targets for `[m1, m2]`.
    fn cartesian_to_motors(&self, point: Point) -> [i64; 2];

    /// Convert motor step counts back to a Cartesian point.
    fn motors_to_cartesian(&self, steps: [i64; 2]) -> Result<Point, MotionError>;

    /// Check if a point can be reached by this geometry.
    fn is_valid_position(&self, point: Point) -> bool;

    /// Cable travel of a single step, mm.
    fn step_resolution(&self) -> f64;
}

/// Cable 1 hangs from the left anchor, cable 2 from the right one; both
/// anchors sit on the same horizontal line. Each motor's step count is the
/// cable length from its anchor to the pen, in steps.
#[derive(Debug, Clone, PartialEq)]
pub struct CableKinematics {
    left_anchor: Point,
    right_anchor: Point,
    mm_per_step: f64,
}

impl CableKinematics {
    pub fn new(machine: &MachineConfig) -> Self {
        Self {
            left_anchor: Point::new(machine.x_min(), machine.anchor_height),
            right_anchor: Point::new(machine.x_max(), machine.anchor_height),
            mm_per_step: machine.mm_per_step(),
        }
    }

    pub fn anchors(&self) -> (Point, Point) {
        (self.left_anchor, self.right_anchor)
    }

    /// Step targets for both motors at `(x, y)`.
    pub fn solve(&self, x: f64, y: f64) -> (i64, i64) {
        let pen = Point::new(x, y);
        let m1 = (self.left_anchor.distance_to(pen) / self.mm_per_step).round() as i64;
        let m2 = (self.right_anchor.distance_to(pen) / self.mm_per_step).round() as i64;
        (m1, m2)
    }
}

impl Kinematics for CableKinematics {
    fn cartesian_to_motors(&self, point: Point) -> [i64; 2] {
        let (m1, m2) = self.solve(point.x, point.y);
        [m1, m2]
    }

    fn motors_to_cartesian(&self, steps: [i64; 2]) -> Result<Point, MotionError> {
        let l1 = steps[0] as f64 * self.mm_per_step;
        let l2 = steps[1] as f64 * self.mm_per_step;
        let separation = self.right_anchor.x - self.left_anchor.x;

        // Intersection of the two cable circles, measured from the left anchor.
        let dx = (separation * separation + l1 * l1 - l2 * l2) / (2.0 * separation);
        let dy_sq = l1 * l1 - dx * dx;
        if dy_sq < 0.0 {
            return Err(MotionError::Kinematics(format!(
                "cable lengths {l1:.3} mm / {l2:.3} mm do not meet"
            )));
        }

        // The pen hangs below the anchor line.
        Ok(Point::new(self.left_anchor.x + dx, self.left_anchor.y - dy_sq.sqrt()))
    }

    fn is_valid_position(&self, point: Point) -> bool {
        point.y < self.left_anchor.y
    }

    fn step_resolution(&self) -> f64 {
        self.mm_per_step
    }
}
