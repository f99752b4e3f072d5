//! Periodic control cycle: sense → decide → actuate → report.
//!
//! ## Cycle body
//! 1. Pull one frame from the vision source and update the estimator.
//! 2. Operator dispatch: with the trigger held, issue the configured entry
//!    call and run the state machine; otherwise return it to Idle and let
//!    teleop write the drivetrain.
//! 3. `Drivetrain::execute` writes the motors; the plant integrates.
//! 4. Build the feedback snapshot (logged every `feedback_interval`).
//!
//! A `DriveError` raised in step 2 is logged and counted; the cycle still
//! completes and the next one runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tagdrive_common::config::ConfigError;
use tagdrive_common::drive::config::{DriveConfig, TriggerAction};
use tagdrive_common::drive::error::{DriveError, DriveStatus};
use thiserror::Error;
use tracing::{info, warn};

use crate::drivetrain::differential::Drivetrain;
use crate::feedback::Feedback;
use crate::sensors::{HeadingSensor, VisionSource};
use crate::sim::SimulatedRobot;
use crate::state::DriveControl;
use crate::teleop::{OperatorInput, Teleop};
use crate::tunables::TunableStore;
use crate::vision::estimator::TargetEstimator;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing and fault statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    pub cycle_count: u64,
    /// Wall time of the latest tick, ns.
    pub last_cycle_ns: u64,
    /// `u64::MAX` until the first tick is recorded.
    pub min_cycle_ns: u64,
    pub max_cycle_ns: u64,
    /// Running sum for the average.
    pub sum_cycle_ns: u64,
    /// Cycles that took longer than the period.
    pub overruns: u64,
    /// Cycles whose control step raised a `DriveError`.
    pub faults: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: u64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            faults: 0,
        }
    }

    /// Record a cycle duration.
    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> u64 {
        self.sum_cycle_ns.checked_div(self.cycle_count).unwrap_or(0)
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors that stop the cycle runner.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Configuration rejected before the loop started.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Telemetry could not be serialized.
    #[error("feedback serialization failed: {0}")]
    Feedback(#[from] serde_json::Error),
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the whole pipeline for the simulated robot.
#[derive(Debug)]
pub struct CycleRunner {
    estimator: TargetEstimator,
    control: DriveControl,
    drivetrain: Drivetrain,
    teleop: Teleop,
    robot: SimulatedRobot,
    trigger_action: TriggerAction,
    period: Duration,
    feedback_interval: u64,
    sim_trigger: bool,
    stats: CycleStats,
    last_feedback: Option<Feedback>,
}

impl CycleRunner {
    /// Validate `config` and build every component; the drivetrain starts
    /// enabled.
    pub fn new(config: &DriveConfig) -> Result<Self, CycleError> {
        config.validate()?;
        Ok(Self::with_store(config, TunableStore::new(config.tunables)))
    }

    /// Like `new`, sharing an existing tunable store (for an operator
    /// console). `config` must already be validated.
    pub fn with_store(config: &DriveConfig, store: TunableStore) -> Self {
        let ctl = &config.control;
        let mut drivetrain = Drivetrain::from_config(&config.drivetrain);
        drivetrain.on_enable();

        info!(
            cycle_time_ms = ctl.cycle_time_ms,
            filter_window = config.vision.filter_window,
            trigger_action = ?ctl.trigger_action,
            "cycle runner initialized"
        );

        Self {
            estimator: TargetEstimator::new(config.vision.filter_window),
            control: DriveControl::new(ctl, store),
            drivetrain,
            teleop: Teleop::new(&config.teleop),
            robot: SimulatedRobot::new(&config.sim, ctl.camera_offset, ctl.period_s()),
            trigger_action: ctl.trigger_action,
            period: Duration::from_millis(u64::from(ctl.cycle_time_ms)),
            feedback_interval: u64::from(ctl.feedback_interval.max(1)),
            sim_trigger: config.sim.trigger_held,
            stats: CycleStats::new(),
            last_feedback: None,
        }
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn control(&self) -> &DriveControl {
        &self.control
    }

    pub fn estimator(&self) -> &TargetEstimator {
        &self.estimator
    }

    pub fn drivetrain(&self) -> &Drivetrain {
        &self.drivetrain
    }

    pub fn robot(&self) -> &SimulatedRobot {
        &self.robot
    }

    pub fn last_feedback(&self) -> Option<&Feedback> {
        self.last_feedback.as_ref()
    }

    /// Robot disabled: stop everything and clear controller history and
    /// filtered target samples.
    pub fn disable(&mut self) {
        self.control.on_disable();
        self.estimator.reset();
        self.drivetrain.on_disable();
    }

    /// Run one cycle with `input`. Control errors are absorbed into the
    /// returned feedback (`DriveStatus::FAULT`) and the fault counter.
    pub fn tick(&mut self, input: &OperatorInput) -> Feedback {
        // ═══ SENSE ═══
        let detection = self.robot.latest_detection();
        self.estimator.update(detection);

        // ═══ DECIDE ═══
        let result = self.control_step(input);
        if let Err(ref e) = result {
            self.stats.faults += 1;
            warn!(cycle = self.stats.cycle_count, error = %e, "control step failed");
        }

        // ═══ ACTUATE ═══
        self.drivetrain.execute();
        let dt = self.period.as_secs_f64();
        self.robot.step(self.drivetrain.last_speeds(), dt);

        // ═══ REPORT ═══
        let mut fb = Feedback::from_estimator(
            self.stats.cycle_count,
            self.robot.angle_degrees(),
            &self.estimator,
        );
        let (forward, turn) = self.drivetrain.last_command();
        fb.behavior = self.control.behavior();
        fb.forward = forward;
        fb.turn = turn;
        fb.status.set(DriveStatus::EXECUTING, self.control.is_executing());
        fb.status.set(DriveStatus::AT_SETPOINT, self.control.at_setpoint());
        fb.status.set(DriveStatus::TELEOP, !input.trigger);
        fb.status.set(DriveStatus::FAULT, result.is_err());
        self.last_feedback = Some(fb);
        fb
    }

    fn control_step(&mut self, input: &OperatorInput) -> Result<(), DriveError> {
        if !input.trigger {
            self.control.done();
            self.teleop.drive(&mut self.drivetrain, input)?;
            return Ok(());
        }

        let est = &self.estimator;
        match self.trigger_action {
            TriggerAction::TurnToAngle { angle } => {
                self.control.turn_to_angle(angle);
            }
            TriggerAction::TurnToTag => {
                self.control.turn_to_tag(est, &self.robot);
            }
            TriggerAction::DriveFromTag { distance } => {
                self.control.drive_from_tag(distance, est);
            }
            TriggerAction::FollowTag { distance } => {
                self.control.follow_tag(distance, est);
            }
            TriggerAction::TagControl => {
                self.control.tag_control(est);
            }
        }
        self.control.execute(&mut self.drivetrain, est, &self.robot)
    }

    /// Pace ticks at the configured period until `max_cycles` have run
    /// (`None`: forever) or `running` is cleared.
    ///
    /// The simulated operator holds the trigger per `sim.trigger_held`.
    pub fn run(&mut self, max_cycles: Option<u64>, running: &AtomicBool) -> Result<(), CycleError> {
        let input = OperatorInput {
            trigger: self.sim_trigger,
            ..OperatorInput::default()
        };
        let budget_ns = self.period.as_nanos() as u64;

        while running.load(Ordering::SeqCst) {
            if max_cycles.is_some_and(|n| self.stats.cycle_count >= n) {
                break;
            }
            let cycle_start = Instant::now();

            let fb = self.tick(&input);
            if self.stats.cycle_count % self.feedback_interval == 0 {
                info!(target: "tagdrive::feedback", "{}", fb.to_json()?);
            }

            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as u64;
            self.stats.record(duration_ns);
            if duration_ns > budget_ns {
                self.stats.overruns += 1;
            }

            if let Some(remaining) = self.period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }

        info!(
            cycles = self.stats.cycle_count,
            avg_ns = self.stats.avg_cycle_ns(),
            max_ns = self.stats.max_cycle_ns,
            overruns = self.stats.overruns,
            faults = self.stats.faults,
            "cycle loop stopped"
        );
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
