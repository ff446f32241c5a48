// src/motion/arc.rs - Circular arcs as chains of short chords
use std::f64::consts::TAU;

use crate::config::MotionConfig;
use crate::hardware::CoilDriver;
use crate::motion::MotionError;
use crate::motion::machine::{MachineState, Point};
use crate::motion::segment::{SegmentMover, SegmentReport};
use crate::scheduler::TimeInterface;

/// Splits arcs into chords of roughly `segment_length` mm.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcSubdivider {
    segment_length: f64,
    correction_interval: u32,
    min_arc_length: f64,
}

/// Geometry of one arc, ready to be walked chord by chord.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcPlan {
    pub center: Point,
    pub radius: f64,
    /// Signed sweep in radians: positive counter-clockwise, negative clockwise.
    pub angular_travel: f64,
    pub segments: u32,
    pub theta_per_segment: f64,
    start_radius: (f64, f64),
    correction_interval: u32,
}

impl ArcSubdivider {
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            segment_length: config.arc_segment_length,
            correction_interval: config.arc_correction_interval.max(1),
            min_arc_length: config.min_arc_length,
        }
    }

    /// Plan an arc from `start` to `destination` around `start + center_offset`.
    ///
    /// Returns `None` when the arc is too short to move (this includes a zero
    /// radius). Coincident start and end always mean one full circle.
    pub fn plan(&self, start: Point, destination: Point, center_offset: [f64; 2], clockwise: bool) -> Option<ArcPlan> {
        // Radius vector from the center to the current position.
        let (r_p, r_q) = (-center_offset[0], -center_offset[1]);
        let radius = r_p.hypot(r_q);
        let center = Point::new(start.x - r_p, start.y - r_q);
        let rt_x = destination.x - center.x;
        let rt_y = destination.y - center.y;

        let angular_travel = if start == destination {
            if clockwise { -TAU } else { TAU }
        } else {
            let mut angle = (r_p * rt_y - r_q * rt_x).atan2(r_p * rt_x + r_q * rt_y);
            if angle < 0.0 {
                angle += TAU;
            }
            if clockwise {
                angle -= TAU;
            }
            angle
        };

        let arc_length = angular_travel.abs() * radius;
        if arc_length < self.min_arc_length {
            return None;
        }

        let segments = ((arc_length / self.segment_length).floor() as u32).max(1);
        Some(ArcPlan {
            center,
            radius,
            angular_travel,
            segments,
            theta_per_segment: angular_travel / f64::from(segments),
            start_radius: (r_p, r_q),
            correction_interval: self.correction_interval,
        })
    }

    /// Trace an arc through `mover`, ending exactly on `destination`.
    pub fn move_along_arc<D, T>(
        &self,
        mover: &mut SegmentMover<D>,
        state: &mut MachineState,
        clock: &T,
        destination: Point,
        center_offset: [f64; 2],
        clockwise: bool,
    ) -> SegmentReport
    where
        D: CoilDriver,
        T: TimeInterface + ?Sized,
    {
        let Some(plan) = self.plan(state.current_cartesian, destination, center_offset, clockwise) else {
            tracing::debug!(?destination, ?center_offset, "arc below minimum length, skipped");
            return SegmentReport::default();
        };

        tracing::debug!(
            center = ?plan.center,
            radius = plan.radius,
            sweep = plan.angular_travel,
            segments = plan.segments,
            "arc"
        );

        let mut report = SegmentReport::default();
        for chord_end in plan.chord_points() {
            report += mover.move_along_path(state, clock, chord_end);
        }
        report += mover.move_along_path(state, clock, destination);
        report
    }
}

impl ArcPlan {
    pub fn arc_length(&self) -> f64 {
        self.angular_travel.abs() * self.radius
    }

    /// Intermediate chord endpoints, excluding the start and the destination.
    pub fn chord_points(&self) -> ChordPoints<'_> {
        ChordPoints {
            plan: self,
            index: 0,
            radius: self.start_radius,
            until_correction: self.correction_interval,
            sin_t: self.theta_per_segment,
            cos_t: 1.0 - 0.5 * self.theta_per_segment * self.theta_per_segment,
        }
    }
}

/// Rotates the radius vector with the small-angle approximation and snaps
/// it back to the exact rotation every `correction_interval` chords.
#[derive(Debug, Clone)]
pub struct ChordPoints<'a> {
    plan: &'a ArcPlan,
    index: u32,
    radius: (f64, f64),
    until_correction: u32,
    sin_t: f64,
    cos_t: f64,
}

impl Iterator for ChordPoints<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        self.index += 1;
        if self.index >= self.plan.segments {
            return None;
        }

        self.until_correction -= 1;
        let (r_p, r_q) = self.radius;
        self.radius = if self.until_correction != 0 {
            (r_p * self.cos_t - r_q * self.sin_t, r_p * self.sin_t + r_q * self.cos_t)
        } else {
            self.until_correction = self.plan.correction_interval;
            let angle = f64::from(self.index) * self.plan.theta_per_segment;
            let (sin_a, cos_a) = angle.sin_cos();
            let (p0, q0) = self.plan.start_radius;
            (p0 * cos_a - q0 * sin_a, p0 * sin_a + q0 * cos_a)
        };

        Some(Point::new(self.plan.center.x + self.radius.0, self.plan.center.y + self.radius.1))
    }
}

/// Resolve a radius-form arc (`G2/G3 ... R`) into a center offset from `start`.
///
/// A negative `radius` selects the longer of the two possible arcs. A zero
/// radius or coincident endpoints give a zero offset, which plans to no
/// motion.
pub fn center_offset_from_radius(
    start: Point,
    end: Point,
    radius: f64,
    clockwise: bool,
) -> Result<[f64; 2], MotionError> {
    if radius == 0.0 || start == end {
        return Ok([0.0, 0.0]);
    }

    let e = if clockwise ^ (radius < 0.0) { -1.0 } else { 1.0 };
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let chord = dx.hypot(dy);
    let h_sq = radius * radius - (chord * 0.5) * (chord * 0.5);
    if h_sq < -1e-9 {
        return Err(MotionError::InvalidArc(format!(
            "radius {radius} is shorter than half the chord ({:.4})",
            chord * 0.5
        )));
    }
    let h = h_sq.max(0.0).sqrt();

    let mid = start.lerp(end, 0.5);
    let (sx, sy) = (-dy / chord, dx / chord);
    let cx = mid.x + e * h * sx;
    let cy = mid.y + e * h * sy;
    Ok([cx - start.x, cy - start.y])
}
