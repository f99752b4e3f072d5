//! Integration test: closed-loop runs against the simulated robot.

use tagdrive_common::config::ConfigLoader;
use tagdrive_common::drive::behavior::ActiveBehavior;
use tagdrive_common::drive::config::DriveConfig;
use tagdrive_common::drive::error::DriveStatus;
use tagdrive_control::cycle::CycleRunner;
use tagdrive_control::sensors::HeadingSensor;
use tagdrive_control::teleop::OperatorInput;
use tagdrive_control::tunables::TunableStore;

const BASE: &str = r#"
[drivetrain]
front_left_id = 8
front_right_id = 9
back_left_id = 7
back_right_id = 11
controller_type = "TALON_FX"
"#;

fn runner(extra: &str) -> CycleRunner {
    let cfg = DriveConfig::from_toml(&format!("{BASE}\n{extra}")).unwrap();
    CycleRunner::new(&cfg).unwrap()
}

const HELD: OperatorInput = OperatorInput {
    trigger: true,
    x: 0.0,
    y: 0.0,
};

#[test]
fn follow_tag_closes_to_standoff_and_faces_tag() {
    let mut r = runner("");
    let mut acquired_at = None;
    for cycle in 0..400 {
        let fb = r.tick(&HELD);
        if acquired_at.is_none() && fb.status.contains(DriveStatus::HAS_TARGET) {
            acquired_at = Some(cycle);
        }
        if acquired_at.is_some() {
            assert!(fb.status.contains(DriveStatus::HAS_TARGET), "lost at {cycle}");
            assert_eq!(fb.behavior, ActiveBehavior::FollowingTag);
            assert!(fb.forward.abs() <= 0.3 && fb.turn.abs() <= 0.3);
        }
    }

    // Pipeline latency of 30 ms at 20 ms cycles delays the first frame.
    assert_eq!(acquired_at, Some(2));
    let x = r.estimator().x().unwrap();
    assert!((x - 0.3).abs() < 0.05, "standoff {x}");
    // Tag was ahead-left: the robot turned counter-clockwise.
    assert!(r.robot().angle_degrees() < -10.0);
    assert!(r.robot().position().x > 1.0);
    assert_eq!(r.stats().faults, 0);
}

#[test]
fn dropped_frames_do_not_lose_the_target() {
    let mut r = runner("[sim]\ndropout_every = 4\n");
    for _ in 0..3 {
        r.tick(&HELD);
    }
    for _ in 0..200 {
        let fb = r.tick(&HELD);
        assert!(fb.status.contains(DriveStatus::HAS_TARGET));
    }
}

#[test]
fn tag_control_drives_forward_away_from_tag_one() {
    let mut r = runner(
        "[control]\ntrigger_action = { kind = \"tag_control\" }\n[sim]\ntag_id = 1\nlatency_s = 0.0\n",
    );
    let fb = r.tick(&HELD);
    assert_eq!(fb.behavior, ActiveBehavior::DrivingForward);
    assert_eq!((fb.forward, fb.turn), (0.3, 0.0));
    for _ in 0..20 {
        r.tick(&HELD);
    }
    assert!(r.robot().position().x < 0.0);
}

#[test]
fn turn_to_angle_trigger_reaches_heading() {
    let mut r = runner(
        "[control]\ntrigger_action = { kind = \"turn_to_angle\", angle = 90.0 }\n",
    );
    for _ in 0..500 {
        r.tick(&HELD);
    }
    let angle = r.robot().angle_degrees();
    assert!((angle - 90.0).abs() < 5.0, "angle {angle}");
    assert_eq!(r.control().behavior(), ActiveBehavior::TurningToAngle);
}

#[test]
fn live_gain_change_takes_effect_next_cycle() {
    let cfg = DriveConfig::from_toml(&format!(
        "{BASE}\n[control]\ntrigger_action = {{ kind = \"turn_to_angle\", angle = 45.0 }}\n"
    ))
    .unwrap();
    let console = TunableStore::new(cfg.tunables);
    let mut r = CycleRunner::with_store(&cfg, console.clone());

    console.set_by_name("turn_to_angle_kP", 0.0).unwrap();
    console.set_by_name("turn_to_angle_kD", 0.0).unwrap();
    let fb = r.tick(&HELD);
    assert_eq!(fb.turn, 0.0);

    console.set_by_name("turn_to_angle_kP", 0.01).unwrap();
    let fb = r.tick(&HELD);
    assert!((fb.turn + 0.3).abs() < 1e-12);
}

#[test]
fn release_returns_to_idle_and_teleop() {
    let mut r = runner("");
    for _ in 0..5 {
        r.tick(&HELD);
    }
    assert!(r.control().is_executing());
    let fb = r.tick(&OperatorInput {
        trigger: false,
        x: -0.5,
        y: 0.0,
    });
    assert_eq!(fb.behavior, ActiveBehavior::Idle);
    assert!(fb.status.contains(DriveStatus::TELEOP));
    assert!((fb.turn - 0.25).abs() < 1e-12);
}
