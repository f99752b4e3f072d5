//! Differential drivetrain acting as the actuation sink.
//!
//! `arcade_drive` only latches the command; `execute` (once per cycle,
//! after the state machine) mixes it into wheel speeds, writes the motor
//! groups and then resets the latched command to zero, so a cycle in which
//! nothing writes the drivetrain produces a stop rather than a stale
//! command.

use tagdrive_common::drive::config::{DrivetrainConfig, IdleMode};
use tagdrive_common::drive::error::DriveError;
use tracing::{debug, info};

use super::motor::MotorController;
use super::{ActuationSink, check_range};

// ─── Kinematics ─────────────────────────────────────────────────────

/// Normalized per-side wheel speeds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    pub left: f64,
    pub right: f64,
}

/// Arcade inverse kinematics.
///
/// Inputs are clamped to [-1, 1] and optionally squared (sign kept). A
/// positive `turn` is counter-clockwise. When `|forward| + |turn|` would
/// saturate, both sides are scaled so the larger one is exactly 1.
pub fn arcade_drive_ik(forward: f64, turn: f64, square_inputs: bool) -> WheelSpeeds {
    let mut x = forward.clamp(-1.0, 1.0);
    let mut z = turn.clamp(-1.0, 1.0);
    if square_inputs {
        x *= x.abs();
        z *= z.abs();
    }

    let greater = x.abs().max(z.abs());
    if greater == 0.0 {
        return WheelSpeeds::default();
    }
    let lesser = x.abs().min(z.abs());
    let saturated = (greater + lesser) / greater;

    WheelSpeeds {
        left: (x - z) / saturated,
        right: (x + z) / saturated,
    }
}

// ─── Motor group ────────────────────────────────────────────────────

/// Front and back motor of one drivetrain side.
#[derive(Debug, Clone, PartialEq)]
pub struct MotorGroup {
    pub front: MotorController,
    pub back: MotorController,
    inverted: bool,
}

impl MotorGroup {
    pub fn new(front: MotorController, back: MotorController) -> Self {
        Self {
            front,
            back,
            inverted: false,
        }
    }

    /// Invert the whole side (the mirrored side of a differential chassis).
    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn set(&mut self, speed: f64) {
        let speed = if self.inverted { -speed } else { speed };
        self.front.set(speed);
        self.back.set(speed);
    }

    pub fn set_idle_mode(&mut self, mode: IdleMode) {
        self.front.set_idle_mode(mode);
        self.back.set_idle_mode(mode);
    }

    pub fn stop(&mut self) {
        self.front.stop();
        self.back.stop();
    }
}

// ─── Drivetrain ─────────────────────────────────────────────────────

/// Four-motor differential drivetrain.
#[derive(Debug, Clone)]
pub struct Drivetrain {
    left: MotorGroup,
    right: MotorGroup,
    /// Latched command, reset to 0 after every `execute`.
    forward: f64,
    turn: f64,
    /// Square inputs before mixing.
    square_inputs: bool,
    enabled: bool,
    last_speeds: WheelSpeeds,
    last_command: (f64, f64),
}

impl Drivetrain {
    /// Build the drivetrain for the configured controller family.
    ///
    /// The right side is inverted and every motor gets the configured idle
    /// mode. The family was fixed when the configuration was parsed.
    pub fn from_config(cfg: &DrivetrainConfig) -> Self {
        let kind = cfg.controller_type;
        let mut left = MotorGroup::new(
            MotorController::new(kind, cfg.front_left_id),
            MotorController::new(kind, cfg.back_left_id),
        );
        let mut right = MotorGroup::new(
            MotorController::new(kind, cfg.front_right_id),
            MotorController::new(kind, cfg.back_right_id),
        );
        right.set_inverted(true);
        left.set_idle_mode(cfg.idle_mode);
        right.set_idle_mode(cfg.idle_mode);

        info!(
            controller = ?kind,
            idle_mode = ?cfg.idle_mode,
            "drivetrain configured"
        );

        Self {
            left,
            right,
            forward: 0.0,
            turn: 0.0,
            square_inputs: true,
            enabled: false,
            last_speeds: WheelSpeeds::default(),
            last_command: (0.0, 0.0),
        }
    }

    pub fn set_square_inputs(&mut self, square: bool) {
        self.square_inputs = square;
    }

    /// Robot entered an enabled mode.
    pub fn on_enable(&mut self) {
        debug!("drivetrain enabled");
        self.enabled = true;
    }

    /// Robot disabled: drop the latched command and stop the motors.
    pub fn on_disable(&mut self) {
        debug!("drivetrain disabled");
        self.enabled = false;
        self.stop();
        self.left.stop();
        self.right.stop();
        self.last_speeds = WheelSpeeds::default();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Command latched for the current cycle.
    pub fn pending(&self) -> (f64, f64) {
        (self.forward, self.turn)
    }

    /// Command written by the last `execute`.
    pub fn last_command(&self) -> (f64, f64) {
        self.last_command
    }

    /// Wheel speeds written by the last `execute` (before side inversion).
    pub fn last_speeds(&self) -> WheelSpeeds {
        self.last_speeds
    }

    pub fn left(&self) -> &MotorGroup {
        &self.left
    }

    pub fn right(&self) -> &MotorGroup {
        &self.right
    }

    /// Write the latched command to the motors, then reset it to zero.
    pub fn execute(&mut self) {
        let (forward, turn) = (self.forward, self.turn);
        self.forward = 0.0;
        self.turn = 0.0;

        if !self.enabled {
            self.left.stop();
            self.right.stop();
            self.last_speeds = WheelSpeeds::default();
            self.last_command = (0.0, 0.0);
            return;
        }

        let speeds = arcade_drive_ik(forward, turn, self.square_inputs);
        self.left.set(speeds.left);
        self.right.set(speeds.right);
        self.last_speeds = speeds;
        self.last_command = (forward, turn);
    }
}

impl ActuationSink for Drivetrain {
    fn arcade_drive(&mut self, forward: f64, turn: f64) -> Result<(), DriveError> {
        let forward = check_range("forward", forward)?;
        let turn = check_range("turn", turn)?;
        self.forward = forward;
        self.turn = turn;
        Ok(())
    }

    fn stop(&mut self) {
        self.forward = 0.0;
        self.turn = 0.0;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
