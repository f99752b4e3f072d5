//! Drive-control state machine.
//!
//! Behaviors: Idle → {DrivingForward, DrivingBackward, TurningToAngle,
//! DrivingFromTag, FollowingTag} → Idle.
//!
//! Entry calls (`turn_to_angle`, `drive_from_tag`, `turn_to_tag`,
//! `follow_tag`, `tag_control`) must be repeated every cycle by the
//! operator dispatch; `execute` runs the current behavior and writes the
//! actuation sink exactly once. With no entry call in a cycle the current
//! behavior is held until `done()` (or a forced engage) replaces it.
//!
//! Sign conventions:
//! - the heading PID output is negated before actuation (positive turn
//!   decreases the gyro angle);
//! - the distance output `(setpoint - x) * kP` is written as-is, in both
//!   tag behaviors.

use nalgebra::Vector3;
use tagdrive_common::consts::{
    DRIVE_OUTPUT_LIMIT, FIXED_DRIVE_SPEED, HEADING_MAX_DEG, HEADING_MIN_DEG, TAG_ID_BACKWARD,
    TAG_ID_FORWARD,
};
use tagdrive_common::drive::behavior::ActiveBehavior;
use tagdrive_common::drive::config::{ControlConfig, HeadingCorrection};
use tagdrive_common::drive::error::DriveError;
use tagdrive_common::drive::tunables::DriveTunables;
use tracing::{debug, trace, warn};

use crate::control::distance::DistanceController;
use crate::control::geometry::{CorrectionInput, bearing_degrees, compensated_correction};
use crate::control::pid::{PidController, PidGains};
use crate::control::shaping::clamp;
use crate::drivetrain::ActuationSink;
use crate::sensors::HeadingSensor;
use crate::tunables::TunableStore;
use crate::vision::estimator::TargetEstimator;

/// Result of an engage attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngageResult {
    /// Behavior now active.
    Engaged(ActiveBehavior),
    /// Another behavior is active and the engage was not forced.
    Rejected(ActiveBehavior),
}

/// Behavior selection plus the heading and distance controllers.
#[derive(Debug)]
pub struct DriveControl {
    behavior: ActiveBehavior,
    heading: PidController,
    distance: DistanceController,
    store: TunableStore,
    tunables: DriveTunables,
    robot_to_camera: Vector3<f64>,
    correction: HeadingCorrection,
    /// (forward, turn) written by the last `execute`.
    last_output: (f64, f64),
}

impl DriveControl {
    /// Build the controllers from the current tunables.
    ///
    /// The heading controller runs with continuous input over
    /// `[HEADING_MIN_DEG, HEADING_MAX_DEG)` at the configured cycle period.
    pub fn new(cfg: &ControlConfig, store: TunableStore) -> Self {
        let tunables = store.snapshot();
        let t = tunables.turn_to_angle;

        let mut heading = PidController::new(PidGains::new(t.kp, t.ki, t.kd), cfg.period_s());
        heading.set_tolerance(t.tolerance_pos, t.tolerance_vel);
        heading.enable_continuous_input(HEADING_MIN_DEG, HEADING_MAX_DEG);

        let d = tunables.drive_from_tag;
        let [x, y, z] = cfg.camera_offset;

        Self {
            behavior: ActiveBehavior::Idle,
            heading,
            distance: DistanceController::new(d.kp, d.setpoint),
            store,
            tunables,
            robot_to_camera: Vector3::new(x, y, z),
            correction: cfg.heading_correction,
            last_output: (0.0, 0.0),
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn behavior(&self) -> ActiveBehavior {
        self.behavior
    }

    /// True in any behavior but Idle.
    pub fn is_executing(&self) -> bool {
        self.behavior != ActiveBehavior::Idle
    }

    /// Heading controller settled on its setpoint.
    pub fn at_setpoint(&self) -> bool {
        self.heading.at_setpoint()
    }

    pub fn heading_setpoint(&self) -> f64 {
        self.heading.setpoint()
    }

    pub fn distance_setpoint(&self) -> f64 {
        self.distance.setpoint()
    }

    pub fn last_output(&self) -> (f64, f64) {
        self.last_output
    }

    pub fn tunables(&self) -> &TunableStore {
        &self.store
    }

    // ─── Live tunables ──────────────────────────────────────────────

    /// Re-read the tunable store and apply it to both controllers.
    pub fn refresh(&mut self) {
        self.tunables = self.store.snapshot();
        let t = self.tunables.turn_to_angle;
        self.heading.set_gains(PidGains::new(t.kp, t.ki, t.kd));
        self.heading.set_tolerance(t.tolerance_pos, t.tolerance_vel);

        let d = self.tunables.drive_from_tag;
        self.distance.set_gain(d.kp);
        self.distance.set_setpoint(d.setpoint);
    }

    /// Store a new distance setpoint. A non-finite distance is dropped and
    /// the previous setpoint kept.
    fn set_distance(&mut self, distance: f64) {
        let mut next = self.tunables;
        if let Err(err) = next.set_by_name("drive_from_tag_setpoint", distance) {
            warn!(%err, "distance setpoint ignored");
            return;
        }
        self.store.update(|t| t.drive_from_tag.setpoint = distance);
        self.tunables = next;
        self.distance.set_setpoint(distance);
    }

    // ─── Transitions ────────────────────────────────────────────────

    /// Switch to `behavior`.
    ///
    /// Without `force` the switch only happens from Idle or when
    /// `behavior` is already active.
    pub fn engage(&mut self, behavior: ActiveBehavior, force: bool) -> EngageResult {
        if self.behavior == behavior {
            return EngageResult::Engaged(behavior);
        }
        if !force && self.behavior != ActiveBehavior::Idle {
            trace!(active = %self.behavior, requested = %behavior, "engage rejected");
            return EngageResult::Rejected(self.behavior);
        }
        debug!(from = %self.behavior, to = %behavior, force, "behavior change");
        self.behavior = behavior;
        EngageResult::Engaged(behavior)
    }

    /// Return to Idle.
    pub fn done(&mut self) {
        if self.behavior != ActiveBehavior::Idle {
            debug!(from = %self.behavior, "behavior done");
            self.behavior = ActiveBehavior::Idle;
        }
    }

    /// Robot disabled: clear the controller history and go Idle.
    pub fn on_disable(&mut self) {
        self.heading.reset();
        self.done();
        self.last_output = (0.0, 0.0);
    }

    // ─── Entry calls ────────────────────────────────────────────────

    /// Turn to `angle` [deg], or to the last set heading when `None`.
    pub fn turn_to_angle(&mut self, angle: Option<f64>) -> EngageResult {
        if let Some(angle) = angle {
            self.heading.set_setpoint(angle);
        }
        self.engage(ActiveBehavior::TurningToAngle, false)
    }

    /// Hold `distance` [m] from the tag (or the last set distance).
    ///
    /// The distance is stored even without a target; the behavior is only
    /// entered while the estimator reports one.
    pub fn drive_from_tag(
        &mut self,
        distance: Option<f64>,
        estimator: &TargetEstimator,
    ) -> Option<EngageResult> {
        if let Some(distance) = distance {
            self.set_distance(distance);
        }
        estimator
            .has_targets()
            .then(|| self.engage(ActiveBehavior::DrivingFromTag, false))
    }

    /// Aim the heading setpoint at the tag and turn to it. No-op without a
    /// target.
    pub fn turn_to_tag(
        &mut self,
        estimator: &TargetEstimator,
        gyro: &dyn HeadingSensor,
    ) -> Option<EngageResult> {
        let correction = self.heading_correction(estimator, gyro)?;
        Some(self.turn_to_angle(Some(gyro.angle_degrees() + correction)))
    }

    /// Like `drive_from_tag`, but also keeps the robot facing the tag.
    pub fn follow_tag(
        &mut self,
        distance: Option<f64>,
        estimator: &TargetEstimator,
    ) -> Option<EngageResult> {
        if let Some(distance) = distance {
            self.set_distance(distance);
        }
        estimator
            .has_targets()
            .then(|| self.engage(ActiveBehavior::FollowingTag, false))
    }

    /// Drive forward on tag 1, backward on tag 2, otherwise stop. Always
    /// forced so an id change takes effect on the same cycle.
    pub fn tag_control(&mut self, estimator: &TargetEstimator) -> EngageResult {
        match estimator.id() {
            Some(TAG_ID_FORWARD) => self.engage(ActiveBehavior::DrivingForward, true),
            Some(TAG_ID_BACKWARD) => self.engage(ActiveBehavior::DrivingBackward, true),
            _ => {
                self.done();
                EngageResult::Engaged(ActiveBehavior::Idle)
            }
        }
    }

    /// Bearing change [deg] that squares the robot to the tag, `None`
    /// without a target.
    fn heading_correction(
        &self,
        estimator: &TargetEstimator,
        gyro: &dyn HeadingSensor,
    ) -> Option<f64> {
        match self.correction {
            HeadingCorrection::Geometric => {
                let input = CorrectionInput {
                    camera_to_tag: estimator.camera_to_target()?,
                    latency_s: estimator.latency()?,
                    angular_rate_dps: gyro.angular_rate_dps(),
                    settled: self.heading.at_setpoint(),
                };
                Some(compensated_correction(&self.robot_to_camera, &input))
            }
            HeadingCorrection::Bearing => {
                let (x, y) = (estimator.x()?, estimator.y()?);
                Some(bearing_degrees(x, y))
            }
        }
    }

    // ─── Execute ────────────────────────────────────────────────────

    /// Run the current behavior for one cycle and write the sink once.
    ///
    /// Tag behaviors write (0, 0) in a cycle without a target and stay
    /// engaged.
    pub fn execute(
        &mut self,
        sink: &mut dyn ActuationSink,
        estimator: &TargetEstimator,
        gyro: &dyn HeadingSensor,
    ) -> Result<(), DriveError> {
        self.refresh();

        let (forward, turn) = match self.behavior {
            ActiveBehavior::Idle => {
                sink.stop();
                self.last_output = (0.0, 0.0);
                return Ok(());
            }
            ActiveBehavior::DrivingForward => (FIXED_DRIVE_SPEED, 0.0),
            ActiveBehavior::DrivingBackward => (-FIXED_DRIVE_SPEED, 0.0),
            ActiveBehavior::TurningToAngle => (0.0, self.turn_output(gyro)),
            ActiveBehavior::DrivingFromTag => match estimator.x() {
                Some(x) => (self.forward_output(x), 0.0),
                None => (0.0, 0.0),
            },
            ActiveBehavior::FollowingTag => {
                match (self.heading_correction(estimator, gyro), estimator.x()) {
                    (Some(correction), Some(x)) => {
                        self.heading
                            .set_setpoint(gyro.angle_degrees() + correction);
                        (self.forward_output(x), self.turn_output(gyro))
                    }
                    _ => (0.0, 0.0),
                }
            }
        };

        sink.arcade_drive(forward, turn)?;
        self.last_output = (forward, turn);
        Ok(())
    }

    fn turn_output(&mut self, gyro: &dyn HeadingSensor) -> f64 {
        let output = self.heading.calculate(gyro.angle_degrees());
        clamp(-output, -DRIVE_OUTPUT_LIMIT, DRIVE_OUTPUT_LIMIT)
    }

    fn forward_output(&self, x: f64) -> f64 {
        clamp(
            self.distance.calculate(x),
            -DRIVE_OUTPUT_LIMIT,
            DRIVE_OUTPUT_LIMIT,
        )
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivetrain::check_range;
    use crate::sensors::{Detection, FixedHeading};

    /// Records every write.
    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<(f64, f64)>,
        stops: usize,
    }

    impl ActuationSink for RecordingSink {
        fn arcade_drive(&mut self, forward: f64, turn: f64) -> Result<(), DriveError> {
            let forward = check_range("forward", forward)?;
            let turn = check_range("turn", turn)?;
            self.writes.push((forward, turn));
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    fn control() -> DriveControl {
        DriveControl::new(&ControlConfig::default(), TunableStore::default())
    }

    fn tag(id: i32, x: f64, y: f64) -> Detection {
        Detection {
            fiducial_id: id,
            x,
            y,
            z: 0.0,
            latency_s: 0.0,
        }
    }

    fn seen(det: Detection) -> TargetEstimator {
        let mut est = TargetEstimator::new(10);
        est.update(Some(det));
        est
    }

    #[test]
    fn starts_idle_and_stops() {
        let mut dc = control();
        let mut sink = RecordingSink::default();
        let est = TargetEstimator::new(10);
        dc.execute(&mut sink, &est, &FixedHeading::default()).unwrap();
        assert_eq!(dc.behavior(), ActiveBehavior::Idle);
        assert!(!dc.is_executing());
        assert_eq!(sink.stops, 1);
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn turn_to_angle_first_cycle_saturates_inclusively() {
        let store = TunableStore::default();
        store.update(|t| {
            t.turn_to_angle.kp = 0.03;
            t.turn_to_angle.ki = 0.0;
            t.turn_to_angle.kd = 0.0;
        });
        let mut dc = DriveControl::new(&ControlConfig::default(), store);
        let mut sink = RecordingSink::default();
        let est = TargetEstimator::new(10);
        let gyro = FixedHeading {
            angle_deg: 80.0,
            rate_dps: 0.0,
        };

        for _ in 0..3 {
            dc.turn_to_angle(Some(90.0));
            dc.execute(&mut sink, &est, &gyro).unwrap();
        }
        assert_eq!(dc.behavior(), ActiveBehavior::TurningToAngle);
        let (forward, turn) = sink.writes[0];
        assert_eq!(forward, 0.0);
        // 0.03 * 10 lands on the limit; negated because a positive turn
        // lowers the gyro angle.
        assert!((turn + 0.3).abs() < 1e-12);
        assert!(turn >= -0.3);
    }

    #[test]
    fn turn_to_angle_wraps_across_zero() {
        let mut dc = control();
        let mut sink = RecordingSink::default();
        let est = TargetEstimator::new(10);
        let gyro = FixedHeading {
            angle_deg: 359.0,
            rate_dps: 0.0,
        };
        dc.turn_to_angle(Some(1.0));
        dc.execute(&mut sink, &est, &gyro).unwrap();
        // Error is +2°, so the robot turns the short way (angle increasing).
        assert!(sink.writes[0].1 < 0.0);
        assert!(sink.writes[0].1.abs() <= 0.3);
    }

    #[test]
    fn tag_control_forces_on_id_change() {
        let mut dc = control();
        let mut sink = RecordingSink::default();
        let gyro = FixedHeading::default();
        let mut est = TargetEstimator::new(10);

        let mut seen_behaviors = Vec::new();
        for id in [1, 1, 2] {
            est.update(Some(tag(id, 1.0, 0.0)));
            dc.tag_control(&est);
            dc.execute(&mut sink, &est, &gyro).unwrap();
            seen_behaviors.push(dc.behavior());
        }
        assert_eq!(
            seen_behaviors,
            vec![
                ActiveBehavior::DrivingForward,
                ActiveBehavior::DrivingForward,
                ActiveBehavior::DrivingBackward
            ]
        );
        assert_eq!(sink.writes, vec![(0.3, 0.0), (0.3, 0.0), (-0.3, 0.0)]);
    }

    #[test]
    fn tag_control_without_known_id_goes_idle() {
        let mut dc = control();
        let est = seen(tag(1, 1.0, 0.0));
        dc.tag_control(&est);
        assert_eq!(dc.behavior(), ActiveBehavior::DrivingForward);
        let est = seen(tag(7, 1.0, 0.0));
        dc.tag_control(&est);
        assert_eq!(dc.behavior(), ActiveBehavior::Idle);
    }

    #[test]
    fn drive_from_tag_needs_a_target() {
        let mut dc = control();
        let est = TargetEstimator::new(10);
        assert_eq!(dc.drive_from_tag(Some(0.8), &est), None);
        assert_eq!(dc.behavior(), ActiveBehavior::Idle);
        // Distance is remembered anyway.
        assert_eq!(dc.distance_setpoint(), 0.8);
        assert_eq!(dc.tunables().snapshot().drive_from_tag.setpoint, 0.8);
    }

    #[test]
    fn drive_from_tag_distance_sign() {
        let mut dc = control();
        let mut sink = RecordingSink::default();
        let gyro = FixedHeading::default();

        // Farther than the 0.3 m setpoint: negative forward, clamped.
        let est = seen(tag(5, 2.0, 0.0));
        dc.drive_from_tag(None, &est);
        dc.execute(&mut sink, &est, &gyro).unwrap();
        assert_eq!(sink.writes[0], (-0.3, 0.0));

        // Slightly closer than the setpoint: small positive forward.
        let est = seen(tag(5, 0.25, 0.0));
        dc.drive_from_tag(None, &est);
        dc.execute(&mut sink, &est, &gyro).unwrap();
        assert!((sink.writes[1].0 - 0.1).abs() < 1e-9);
    }

    #[test]
    fn tag_behavior_writes_zero_when_target_lost() {
        let mut dc = control();
        let mut sink = RecordingSink::default();
        let gyro = FixedHeading::default();
        let est = seen(tag(5, 2.0, 0.0));
        dc.follow_tag(None, &est);

        let mut lost = TargetEstimator::new(1);
        lost.update(None);
        dc.execute(&mut sink, &lost, &gyro).unwrap();
        assert_eq!(sink.writes, vec![(0.0, 0.0)]);
        assert_eq!(dc.behavior(), ActiveBehavior::FollowingTag);
    }

    #[test]
    fn non_forced_engage_does_not_preempt() {
        let mut dc = control();
        dc.turn_to_angle(Some(45.0));
        let est = seen(tag(5, 1.0, 0.0));
        let result = dc.follow_tag(None, &est);
        assert_eq!(
            result,
            Some(EngageResult::Rejected(ActiveBehavior::TurningToAngle))
        );
        dc.done();
        assert_eq!(
            dc.follow_tag(None, &est),
            Some(EngageResult::Engaged(ActiveBehavior::FollowingTag))
        );
    }

    #[test]
    fn behavior_held_without_entry_call() {
        let mut dc = control();
        let mut sink = RecordingSink::default();
        let est = TargetEstimator::new(10);
        let gyro = FixedHeading::default();
        dc.turn_to_angle(Some(10.0));
        for _ in 0..5 {
            dc.execute(&mut sink, &est, &gyro).unwrap();
        }
        assert_eq!(dc.behavior(), ActiveBehavior::TurningToAngle);
        assert_eq!(sink.writes.len(), 5);
    }

    #[test]
    fn turn_to_tag_aims_left_for_a_tag_on_the_left() {
        let mut dc = control();
        let gyro = FixedHeading {
            angle_deg: 100.0,
            rate_dps: 0.0,
        };
        let est = seen(tag(5, 2.0, 1.0));
        assert!(dc.turn_to_tag(&est, &gyro).is_some());
        assert_eq!(dc.behavior(), ActiveBehavior::TurningToAngle);
        assert!(dc.heading_setpoint() < 100.0);
    }

    #[test]
    fn turn_to_tag_without_target_is_noop() {
        let mut dc = control();
        let est = TargetEstimator::new(10);
        assert!(dc.turn_to_tag(&est, &FixedHeading::default()).is_none());
        assert_eq!(dc.behavior(), ActiveBehavior::Idle);
    }

    #[test]
    fn bearing_mode_uses_simple_heading() {
        let cfg = ControlConfig {
            heading_correction: HeadingCorrection::Bearing,
            ..ControlConfig::default()
        };
        let mut dc = DriveControl::new(&cfg, TunableStore::default());
        let est = seen(tag(5, 1.0, -1.0));
        dc.turn_to_tag(&est, &FixedHeading::default());
        assert!((dc.heading_setpoint() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn follow_tag_drives_both_axes_with_shared_distance_sign() {
        let mut dc = control();
        let mut sink = RecordingSink::default();
        let gyro = FixedHeading::default();
        let est = seen(tag(5, 2.0, 1.0));
        dc.follow_tag(Some(0.5), &est);
        dc.execute(&mut sink, &est, &gyro).unwrap();
        let (forward, turn) = sink.writes[0];
        assert_eq!(forward, -0.3);
        assert!(turn > 0.0 && turn <= 0.3);
    }

    #[test]
    fn live_tunables_apply_next_execute() {
        let mut dc = control();
        let mut sink = RecordingSink::default();
        let est = seen(tag(5, 0.4, 0.0));
        let gyro = FixedHeading::default();
        dc.drive_from_tag(None, &est);
        dc.execute(&mut sink, &est, &gyro).unwrap();
        let console = dc.tunables().clone();
        console.set_by_name("drive_from_tag_kP", 1.0).unwrap();
        dc.execute(&mut sink, &est, &gyro).unwrap();
        assert!((sink.writes[0].0 + 0.2).abs() < 1e-9);
        assert!((sink.writes[1].0 + 0.1).abs() < 1e-9);
    }

    #[test]
    fn sink_error_propagates() {
        struct Rejecting;
        impl ActuationSink for Rejecting {
            fn arcade_drive(&mut self, _: f64, _: f64) -> Result<(), DriveError> {
                Err(DriveError::RangeViolation {
                    axis: "forward",
                    value: 2.0,
                })
            }
            fn stop(&mut self) {}
        }
        let mut dc = control();
        let est = seen(tag(1, 1.0, 0.0));
        dc.tag_control(&est);
        assert!(dc.execute(&mut Rejecting, &est, &FixedHeading::default()).is_err());
    }

    #[test]
    fn on_disable_returns_to_idle() {
        let mut dc = control();
        dc.turn_to_angle(Some(30.0));
        dc.on_disable();
        assert_eq!(dc.behavior(), ActiveBehavior::Idle);
        assert!(!dc.at_setpoint());
    }

    #[test]
    fn nan_heading_is_reported_not_saturated() {
        let mut dc = control();
        let mut sink = RecordingSink::default();
        let est = TargetEstimator::new(10);
        let gyro = FixedHeading {
            angle_deg: f64::NAN,
            rate_dps: 0.0,
        };

        dc.turn_to_angle(Some(90.0));
        let err = dc.execute(&mut sink, &est, &gyro).unwrap_err();
        assert!(matches!(
            err,
            DriveError::RangeViolation { axis: "turn", value } if value.is_nan()
        ));
        assert!(sink.writes.is_empty());
        assert_eq!(dc.last_output(), (0.0, 0.0));
    }

    #[test]
    fn nan_tag_distance_is_reported_not_saturated() {
        let mut dc = control();
        let mut sink = RecordingSink::default();
        let est = seen(tag(5, f64::NAN, 0.0));

        dc.drive_from_tag(None, &est);
        assert_eq!(dc.behavior(), ActiveBehavior::DrivingFromTag);
        let result = dc.execute(&mut sink, &est, &FixedHeading::default());
        assert!(matches!(
            result,
            Err(DriveError::RangeViolation { axis: "forward", .. })
        ));
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn non_finite_distance_keeps_previous_setpoint() {
        let mut dc = control();
        let est = TargetEstimator::new(10);
        dc.drive_from_tag(Some(0.8), &est);
        dc.drive_from_tag(Some(f64::NAN), &est);
        dc.follow_tag(Some(f64::INFINITY), &est);
        assert_eq!(dc.distance_setpoint(), 0.8);
        assert_eq!(dc.tunables().snapshot().drive_from_tag.setpoint, 0.8);

        // Survives the per-cycle refresh as well.
        dc.refresh();
        assert_eq!(dc.distance_setpoint(), 0.8);
    }
}
