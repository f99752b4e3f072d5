//! Operator input and manual (teleop) driving.

use serde::{Deserialize, Serialize};
use tagdrive_common::drive::config::TeleopConfig;
use tagdrive_common::drive::error::DriveError;

use crate::control::shaping::{BoxedCurve, curve_from_config};
use crate::drivetrain::ActuationSink;

/// One cycle of operator input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorInput {
    /// Hold-to-engage trigger: held → state machine, released → teleop.
    pub trigger: bool,
    /// Joystick X (turn axis), raw [-1, 1].
    pub x: f64,
    /// Joystick Y (drive axis), raw [-1, 1].
    pub y: f64,
}

/// Joystick-to-arcade mapping through the configured response curve.
pub struct Teleop {
    curve: BoxedCurve,
}

impl std::fmt::Debug for Teleop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Teleop").finish_non_exhaustive()
    }
}

impl Teleop {
    pub fn new(cfg: &TeleopConfig) -> Self {
        Self {
            curve: curve_from_config(cfg),
        }
    }

    /// `(curve(y), -curve(x))`
    pub fn command(&self, input: &OperatorInput) -> (f64, f64) {
        ((self.curve)(input.y), -(self.curve)(input.x))
    }

    /// Shape `input` and write it to `sink`.
    pub fn drive(
        &self,
        sink: &mut dyn ActuationSink,
        input: &OperatorInput,
    ) -> Result<(f64, f64), DriveError> {
        let (forward, turn) = self.command(input);
        sink.arcade_drive(forward, turn)?;
        Ok((forward, turn))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
