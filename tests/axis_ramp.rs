// Integration tests for the per-axis step-timing ramp

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wallplot_rs::hardware::UnipolarCoils;
use wallplot_rs::motion::{AxisRamp, TickOutcome, run_axes_to_completion};
use wallplot_rs::{Micros, RecordingPins, SimClock, TimeInterface};

type TestAxis = AxisRamp<UnipolarCoils<RecordingPins>>;

fn axis(speed: f64, accel: f64) -> TestAxis {
    let mut axis = AxisRamp::new(UnipolarCoils::new(RecordingPins::new()));
    axis.set_speed(speed);
    axis.set_acceleration(accel);
    axis
}

/// Per emitted step (the final one excluded): the period waited for it and
/// the acceleration sign in force afterwards.
#[derive(Default)]
struct Trace {
    periods: Vec<f64>,
    signs: Vec<i8>,
}

/// Poll `axis` on `clock` until its move completes. `on_step` runs after
/// every emitted step and may redirect the move.
fn drive(axis: &mut TestAxis, clock: &SimClock, mut on_step: impl FnMut(&mut TestAxis)) -> Trace {
    let mut trace = Trace::default();
    loop {
        let now = clock.now_micros();
        match axis.tick(now) {
            TickOutcome::Complete => return trace,
            TickOutcome::StepEmitted => {
                trace.periods.push(axis.state().current_step_period_us);
                trace.signs.push(axis.state().acceleration_sign);
                on_step(axis);
            }
            TickOutcome::Continue => clock.delay_micros(axis.micros_until_next_step(now).max(1)),
        }
    }
}

#[test]
fn long_move_reaches_cruise_then_decelerates() {
    let clock = SimClock::new();
    let mut a = axis(1000.0, 2000.0);
    a.begin_move(5000);
    assert_eq!(a.deceleration_distance(), 250);

    let trace = drive(&mut a, &clock, |_| {});

    assert_eq!(a.current_position(), 5000);
    assert_eq!(trace.periods.len(), 4999);
    assert_eq!(a.driver().pins().step_count(), 5000);

    // Never faster than cruise, and cruise is actually reached.
    let fastest = trace.periods.iter().copied().fold(f64::INFINITY, f64::min);
    assert_eq!(fastest, 1000.0);

    // Deceleration starts exactly when 250 steps remain.
    let flip = trace.signs.iter().position(|s| *s == -1).unwrap();
    assert_eq!(flip, 5000 - 250);
    assert!(trace.signs[..flip].iter().all(|s| *s == 1));
    for w in trace.periods[flip..].windows(2) {
        assert!(w[1] > w[0], "period shrank while decelerating: {w:?}");
    }
    for w in trace.periods[..=flip].windows(2) {
        assert!(w[1] <= w[0], "period grew while accelerating: {w:?}");
    }

    assert_eq!(a.current_velocity(), 0.0);
}

#[test]
fn first_step_waits_initial_period() {
    let clock = SimClock::new();
    let mut a = axis(1000.0, 2000.0);
    a.begin_move(10);
    drive(&mut a, &clock, |_| {});
    // 1e6 / sqrt(2 * 2000) ≈ 15811 µs before the first step, then faster.
    let first = 1e6 / 4000.0_f64.sqrt();
    assert!(clock.elapsed().as_micros() as f64 > first);
}

#[test]
fn short_moves_use_triangular_profile() {
    let mut rng = StdRng::seed_from_u64(0x57e9);
    for _ in 0..40 {
        let travel: i64 = rng.random_range(4..=500);
        let clock = SimClock::new();
        let mut a = axis(1000.0, 2000.0);
        a.begin_move(travel);

        let half = (travel / 2) as u64;
        assert_eq!(a.deceleration_distance(), half, "travel {travel}");

        let trace = drive(&mut a, &clock, |_| {});
        assert_eq!(a.current_position(), travel);

        let flip = trace.signs.iter().position(|s| *s == -1).unwrap();
        assert_eq!(flip as i64, travel - half as i64, "travel {travel}");
        for w in trace.periods[flip..].windows(2) {
            assert!(w[1] > w[0]);
        }
    }
}

#[test]
fn extreme_profile_runs_triangular() {
    let clock = SimClock::new();
    let mut a = axis(1e10, 1.0);
    a.begin_move(10);
    assert_eq!(a.deceleration_distance(), 5);

    let trace = drive(&mut a, &clock, |_| {});
    assert_eq!(a.current_position(), 10);
    let flip = trace.signs.iter().position(|s| *s == -1).unwrap();
    assert_eq!(flip, 5);
    assert!(trace.periods.iter().all(|p| p.is_finite() && *p > 0.0));
}

#[test]
fn negative_moves_mirror_positive_ones() {
    let clock = SimClock::new();
    let mut up = axis(1000.0, 2000.0);
    up.begin_move(300);
    let forward = drive(&mut up, &clock, |_| {});

    let clock = SimClock::new();
    let mut down = axis(1000.0, 2000.0);
    down.begin_move(-300);
    let backward = drive(&mut down, &clock, |_| {});

    assert_eq!(down.current_position(), -300);
    assert_eq!(forward.periods, backward.periods);
}

#[test]
fn stop_during_cruise_decelerates_over_one_deceleration_distance() {
    let clock = SimClock::new();
    let mut a = axis(1000.0, 2000.0);
    a.begin_move(5000);

    let mut stopped_at = None;
    let trace = drive(&mut a, &clock, |axis| {
        if stopped_at.is_none() && axis.current_position() == 1000 {
            axis.request_stop();
            stopped_at = Some(axis.target_position());
        }
    });

    assert_eq!(stopped_at, Some(1250));
    assert_eq!(a.current_position(), 1250);
    // Still cruising when the stop lands, then strictly slowing.
    assert_eq!(trace.periods[999], 1000.0);
    for w in trace.periods[1000..].windows(2) {
        assert!(w[1] > w[0]);
    }
}

#[test]
fn stop_within_deceleration_distance_keeps_target() {
    let clock = SimClock::new();
    let mut a = axis(1000.0, 2000.0);
    a.begin_move(5000);
    drive(&mut a, &clock, |axis| {
        if axis.current_position() == 4900 {
            axis.request_stop();
            assert_eq!(axis.target_position(), 5000);
        }
    });
    assert_eq!(a.current_position(), 5000);
}

#[test]
fn random_stops_never_overshoot() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let travel: i64 = rng.random_range(10..=2000);
        let stop_at: i64 = rng.random_range(1..travel);
        let clock = SimClock::new();
        let mut a = axis(2000.0, 8000.0);
        a.begin_move(travel);
        let decel = a.deceleration_distance() as i64;

        drive(&mut a, &clock, |axis| {
            if axis.current_position() == stop_at {
                axis.request_stop();
            }
        });

        let expected = stop_at + decel.min(travel - stop_at);
        assert_eq!(a.current_position(), expected, "travel {travel}, stop at {stop_at}");
    }
}

#[test]
fn move_completes_across_counter_wrap() {
    let clock = SimClock::starting_at(Micros(u32::MAX - 50_000));
    let mut a = axis(1000.0, 2000.0);
    a.move_to_position(400, &clock);
    assert_eq!(a.current_position(), 400);
    assert!(clock.now_micros().as_u32() < 1_000_000);
}

#[test]
fn relative_moves_accumulate() {
    let clock = SimClock::new();
    let mut a = axis(1000.0, 2000.0);
    a.set_current_position(100);
    a.move_relative(25, &clock);
    a.move_relative(-60, &clock);
    assert_eq!(a.current_position(), 65);
    assert_eq!(a.driver().pins().step_count(), 85);
}

#[test]
fn axes_run_together_share_the_clock() {
    let clock = SimClock::new();
    let mut axes = [axis(1000.0, 2000.0), axis(1000.0, 2000.0)];
    axes[0].begin_move(600);
    axes[1].begin_move(-150);
    run_axes_to_completion(&mut axes, &clock);
    assert_eq!(axes[0].current_position(), 600);
    assert_eq!(axes[1].current_position(), -150);

    // Together they take only as long as the longer move alone.
    let together = clock.elapsed();
    let alone_clock = SimClock::new();
    let mut alone = axis(1000.0, 2000.0);
    alone.move_to_position(600, &alone_clock);
    let slack = together.as_micros().abs_diff(alone_clock.elapsed().as_micros());
    assert!(slack < 2_000, "together {together:?}, alone {:?}", alone_clock.elapsed());
}

#[test]
fn disable_releases_coils() {
    let clock = SimClock::new();
    let mut a = axis(1000.0, 2000.0);
    a.move_relative(3, &clock);
    assert!(a.driver().is_enabled());
    a.disable();
    assert!(!a.driver().is_enabled());
    assert_eq!(a.driver().pins().last(), Some([false; 4]));
}
