//! Integration test: per-cycle control scenarios.
//!
//! Drives the estimator, the state machine and a real drivetrain together,
//! one cycle at a time, the way the cycle runner does.

use tagdrive_common::drive::behavior::ActiveBehavior;
use tagdrive_common::drive::config::{ControlConfig, ControllerType, DrivetrainConfig, IdleMode};
use tagdrive_common::drive::error::DriveError;
use tagdrive_control::control::pid::{PidController, PidGains};
use tagdrive_control::control::shaping::clamp;
use tagdrive_control::drivetrain::ActuationSink;
use tagdrive_control::drivetrain::differential::Drivetrain;
use tagdrive_control::sensors::{Detection, FixedHeading, ScriptedVision, VisionSource};
use tagdrive_control::state::DriveControl;
use tagdrive_control::tunables::TunableStore;
use tagdrive_control::vision::estimator::TargetEstimator;

// ── Fixtures ────────────────────────────────────────────────────────

fn drivetrain() -> Drivetrain {
    let mut dt = Drivetrain::from_config(&DrivetrainConfig {
        front_left_id: 8,
        front_right_id: 9,
        back_left_id: 7,
        back_right_id: 11,
        controller_type: ControllerType::TalonFx,
        idle_mode: IdleMode::Brake,
    });
    dt.on_enable();
    dt
}

fn detection(id: i32, x: f64, y: f64, z: f64) -> Detection {
    Detection {
        fiducial_id: id,
        x,
        y,
        z,
        latency_s: 0.025,
    }
}

// ── Estimator ───────────────────────────────────────────────────────

#[test]
fn three_hits_then_misses_drops_target_at_cycle_13() {
    let frames = std::iter::repeat_n(Some(detection(4, 1.0, 0.1, 0.2)), 3)
        .chain(std::iter::repeat_n(None, 12));
    let mut vision = ScriptedVision::new(frames);
    let mut est = TargetEstimator::new(10);

    let mut presence = Vec::new();
    for _ in 0..15 {
        est.update(vision.latest_detection());
        presence.push(est.has_targets());
    }
    // Cycles are 1-based: present through cycle 12, lost from cycle 13.
    assert!(presence[..12].iter().all(|p| *p));
    assert!(presence[12..].iter().all(|p| !*p));
    assert_eq!(est.x(), None);
    assert_eq!(est.id(), None);
}

#[test]
fn constant_detection_converges_to_raw_values() {
    let mut est = TargetEstimator::new(10);
    est.update(Some(detection(4, 3.0, -2.0, 9.0)));
    for _ in 0..10 {
        est.update(Some(detection(4, 1.25, 0.5, -0.75)));
    }
    assert_eq!(est.x(), Some(1.25));
    assert_eq!(est.y(), Some(0.5));
    assert_eq!(est.z(), Some(-0.75));
}

#[test]
fn single_frame_outlier_is_rejected() {
    let mut est = TargetEstimator::new(5);
    for x in [1.0, 1.0, 40.0, 1.0, 1.0] {
        est.update(Some(detection(4, x, 0.0, 0.0)));
    }
    assert_eq!(est.x(), Some(1.0));
}

// ── Heading controller ──────────────────────────────────────────────

#[test]
fn continuous_error_is_shortest_arc_on_integer_grid() {
    let mut pid = PidController::new(PidGains::new(1.0, 0.0, 0.0), 0.02);
    pid.enable_continuous_input(0.0, 360.0);
    for a in (0..360).step_by(7) {
        for b in (0..360).step_by(11) {
            pid.set_setpoint(f64::from(a));
            let err = pid.compute_error(f64::from(b));
            let diff = f64::from(a - b);
            assert!(err.abs() <= 180.0, "a={a} b={b} err={err}");
            let wrapped = (err - diff).rem_euclid(360.0);
            assert!(wrapped.abs() < 1e-9 || (wrapped - 360.0).abs() < 1e-9);
        }
    }
}

#[test]
fn clamp_saturates_large_outputs() {
    for v in [10.0, 55.0, 1e9] {
        assert_eq!(clamp(v, -0.3, 0.3), 0.3);
        assert_eq!(clamp(-v, -0.3, 0.3), -0.3);
    }
}

// ── State machine + drivetrain ──────────────────────────────────────

#[test]
fn turn_to_angle_at_80_degrees_commands_full_clamped_turn() {
    let store = TunableStore::default();
    store.update(|t| {
        t.turn_to_angle.kp = 0.03;
        t.turn_to_angle.ki = 0.0;
        t.turn_to_angle.kd = 0.0;
    });
    let mut dc = DriveControl::new(&ControlConfig::default(), store);
    let mut dt = drivetrain();
    let est = TargetEstimator::new(10);
    let gyro = FixedHeading {
        angle_deg: 80.0,
        rate_dps: 0.0,
    };

    dc.turn_to_angle(Some(90.0));
    dc.execute(&mut dt, &est, &gyro).unwrap();
    let (forward, turn) = dt.pending();
    assert_eq!(forward, 0.0);
    assert!((turn.abs() - 0.3).abs() < 1e-12);
    assert!(turn < 0.0);

    dt.execute();
    assert_eq!(dt.pending(), (0.0, 0.0));
    // Negative turn spins clockwise: left side forward.
    assert!(dt.last_speeds().left > 0.0);
}

#[test]
fn tag_control_follows_id_sequence() {
    let mut vision = ScriptedVision::new([
        Some(detection(1, 1.0, 0.0, 0.0)),
        Some(detection(1, 1.0, 0.0, 0.0)),
        Some(detection(2, 1.0, 0.0, 0.0)),
    ]);
    let mut est = TargetEstimator::new(10);
    let mut dc = DriveControl::new(&ControlConfig::default(), TunableStore::default());
    let mut dt = drivetrain();
    let gyro = FixedHeading::default();

    let mut states = Vec::new();
    let mut commands = Vec::new();
    for _ in 0..3 {
        est.update(vision.latest_detection());
        dc.tag_control(&est);
        dc.execute(&mut dt, &est, &gyro).unwrap();
        states.push(dc.behavior());
        dt.execute();
        commands.push(dt.last_command());
    }
    assert_eq!(
        states,
        [
            ActiveBehavior::DrivingForward,
            ActiveBehavior::DrivingForward,
            ActiveBehavior::DrivingBackward,
        ]
    );
    assert_eq!(commands, [(0.3, 0.0), (0.3, 0.0), (-0.3, 0.0)]);
}

#[test]
fn out_of_range_arcade_drive_keeps_previous_command() {
    let mut dt = drivetrain();
    dt.arcade_drive(0.1, 0.2).unwrap();
    let err = dt.arcade_drive(1.5, 0.0).unwrap_err();
    assert!(matches!(err, DriveError::RangeViolation { axis: "forward", .. }));
    assert_eq!(err.to_string(), "improper value for forward entered: 1.5");
    assert_eq!(dt.pending(), (0.1, 0.2));
}

#[test]
fn skipped_entry_call_still_writes_each_cycle() {
    let mut dc = DriveControl::new(&ControlConfig::default(), TunableStore::default());
    let mut dt = drivetrain();
    let est = TargetEstimator::new(10);
    let gyro = FixedHeading {
        angle_deg: 10.0,
        rate_dps: 0.0,
    };
    dc.turn_to_angle(Some(10.0));
    for _ in 0..3 {
        dc.execute(&mut dt, &est, &gyro).unwrap();
        dt.execute();
    }
    assert_eq!(dc.behavior(), ActiveBehavior::TurningToAngle);
    assert_eq!(dt.last_command().0, 0.0);
}

#[test]
fn drive_from_tag_without_target_leaves_behavior() {
    let mut dc = DriveControl::new(&ControlConfig::default(), TunableStore::default());
    let est = TargetEstimator::new(10);
    assert!(dc.drive_from_tag(Some(1.0), &est).is_none());
    assert_eq!(dc.behavior(), ActiveBehavior::Idle);
}

#[test]
fn distance_sign_matches_between_tag_behaviors() {
    let gyro = FixedHeading::default();
    let mut est = TargetEstimator::new(10);
    est.update(Some(detection(5, 0.4, 0.0, 0.0)));

    let mut from_tag = DriveControl::new(&ControlConfig::default(), TunableStore::default());
    let mut dt = drivetrain();
    from_tag.drive_from_tag(None, &est);
    from_tag.execute(&mut dt, &est, &gyro).unwrap();
    let (forward_a, _) = dt.pending();

    let mut follow = DriveControl::new(&ControlConfig::default(), TunableStore::default());
    let mut dt = drivetrain();
    follow.follow_tag(None, &est);
    follow.execute(&mut dt, &est, &gyro).unwrap();
    let (forward_b, _) = dt.pending();

    assert!((forward_a + 0.2).abs() < 1e-9);
    assert_eq!(forward_a, forward_b);
}
