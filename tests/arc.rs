// Integration tests for arc subdivision and arc moves

use std::f64::consts::{FRAC_PI_2, TAU};

use wallplot_rs::config::MotionConfig;
use wallplot_rs::hardware::UnipolarCoils;
use wallplot_rs::motion::{ArcSubdivider, Kinematics, MotionError, MotionRequest, Plotter, Point};
use wallplot_rs::{Config, RecordingPins, SimClock};

fn plotter(clock: &SimClock) -> Plotter<UnipolarCoils<RecordingPins>, &SimClock> {
    let drivers = [
        UnipolarCoils::new(RecordingPins::new()),
        UnipolarCoils::new(RecordingPins::new()),
    ];
    Plotter::new(&Config::default(), drivers, clock)
}

#[test]
fn chord_points_stay_on_the_circle() {
    let arcs = ArcSubdivider::new(&MotionConfig::default());
    let start = Point::new(50.0, 0.0);
    let plan = arcs.plan(start, start, [-50.0, 0.0], false).unwrap();
    assert_eq!(plan.segments, 314);

    let points: Vec<Point> = plan.chord_points().collect();
    assert_eq!(points.len(), 313);
    for p in &points {
        assert!((p.distance_to(plan.center) - 50.0).abs() < 1e-3, "{p:?} off the circle");
    }

    // Every 25th chord snaps to the exact rotation.
    for k in (25..314).step_by(25) {
        let angle = k as f64 * plan.theta_per_segment;
        let exact = Point::new(50.0 * angle.cos(), 50.0 * angle.sin());
        let p = points[k - 1];
        assert!((p.x - exact.x).abs() < 1e-9 && (p.y - exact.y).abs() < 1e-9, "chord {k}");
    }
}

#[test]
fn chord_count_follows_segment_length() {
    let mut config = MotionConfig::default();
    config.arc_segment_length = 0.5;
    let plan = ArcSubdivider::new(&config)
        .plan(Point::new(10.0, 0.0), Point::new(0.0, 10.0), [-10.0, 0.0], false)
        .unwrap();
    // 15.7 mm of arc at 0.5 mm per chord.
    assert_eq!(plan.segments, 31);
    assert!((plan.arc_length() - 10.0 * FRAC_PI_2).abs() < 1e-12);
}

#[test]
fn clockwise_and_counter_clockwise_sweep_opposite_ways() {
    let arcs = ArcSubdivider::new(&MotionConfig::default());
    let start = Point::new(10.0, 0.0);
    let end = Point::new(-10.0, 0.0);
    let ccw = arcs.plan(start, end, [-10.0, 0.0], false).unwrap();
    let cw = arcs.plan(start, end, [-10.0, 0.0], true).unwrap();
    assert!(ccw.angular_travel > 0.0 && cw.angular_travel < 0.0);
    assert!((ccw.angular_travel - cw.angular_travel - TAU).abs() < 1e-9);

    // The counter-clockwise half circle passes over the top.
    let mid = ccw.chord_points().nth(ccw.segments as usize / 2 - 1).unwrap();
    assert!(mid.y > 9.0);
    let mid = cw.chord_points().nth(cw.segments as usize / 2 - 1).unwrap();
    assert!(mid.y < -9.0);
}

#[test]
fn arc_move_ends_exactly_at_destination() {
    let clock = SimClock::new();
    let mut plotter = plotter(&clock);
    plotter
        .execute(MotionRequest::LinearMove { x: Some(10.0), y: Some(0.0), z: None })
        .unwrap();

    let report = plotter
        .execute(MotionRequest::ArcMove { x: Some(0.0), y: Some(10.0), i: -10.0, j: 0.0, clockwise: false })
        .unwrap();

    let destination = Point::new(0.0, 10.0);
    assert_eq!(plotter.state().current_cartesian, destination);
    assert_eq!(
        plotter.state().current_steps,
        plotter.kinematics().cartesian_to_motors(destination)
    );
    assert!(report.steps[0] > 0 && report.steps[1] > 0);
}

#[test]
fn full_circle_returns_home() {
    let clock = SimClock::new();
    let mut plotter = plotter(&clock);
    let home = plotter.state().current_steps;

    let report = plotter
        .execute(MotionRequest::ArcMove { x: None, y: None, i: 5.0, j: 0.0, clockwise: true })
        .unwrap();

    assert_eq!(plotter.state().current_cartesian, Point::default());
    assert_eq!(plotter.state().current_steps, home);
    // A circle of radius 5 mm is about 31 mm of cable motion per motor at most.
    assert!(report.steps[0] > 100 && report.steps[1] > 100);
    assert_eq!(plotter.total_steps(), report.steps);
}

#[test]
fn degenerate_arc_does_not_move() {
    let clock = SimClock::new();
    let mut plotter = plotter(&clock);
    let report = plotter
        .execute(MotionRequest::ArcMove { x: None, y: None, i: 0.0, j: 0.0, clockwise: false })
        .unwrap();
    assert_eq!(report.steps, [0, 0]);
    assert_eq!(clock.elapsed().as_micros(), 0);
}

#[test]
fn arc_above_anchors_is_rejected() {
    let clock = SimClock::new();
    let mut plotter = plotter(&clock);
    let before = plotter.state().clone();
    let err = plotter
        .execute(MotionRequest::ArcMove { x: Some(0.0), y: Some(320.0), i: 0.0, j: 160.0, clockwise: true })
        .unwrap_err();
    assert!(matches!(err, MotionError::Unreachable { .. }));
    assert_eq!(plotter.state(), &before);
}
