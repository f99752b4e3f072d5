//! Live-tunable controller parameters.
//!
//! Tunables are re-read by the controllers once per tick, so an update made
//! between two ticks takes effect on the next one. The external names
//! accepted by [`DriveTunables::set_by_name`] are the ones operators see on
//! the dashboard (`turn_to_angle_kP`, `drive_from_tag_setpoint`, ...).

use serde::{Deserialize, Serialize};

use super::error::DriveError;
use crate::config::ConfigError;

/// Gains and settle tolerance of the heading (turn-to-angle) controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnToAngleTunables {
    /// Proportional gain [1/deg].
    pub kp: f64,
    /// Integral gain (0 = disabled).
    pub ki: f64,
    /// Derivative gain (0 = disabled).
    pub kd: f64,
    /// Position tolerance [deg].
    pub tolerance_pos: f64,
    /// Velocity tolerance [deg/s].
    pub tolerance_vel: f64,
}

impl Default for TurnToAngleTunables {
    fn default() -> Self {
        Self {
            kp: 0.025,
            ki: 0.0,
            kd: 0.003,
            tolerance_pos: 5.0,
            tolerance_vel: 0.1,
        }
    }
}

/// Gain and standoff of the distance controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveFromTagTunables {
    /// Proportional gain [1/m].
    pub kp: f64,
    /// Desired camera-to-tag distance [m].
    pub setpoint: f64,
}

impl Default for DriveFromTagTunables {
    fn default() -> Self {
        Self {
            kp: 2.0,
            setpoint: 0.3,
        }
    }
}

/// All live-tunable parameters of the drive controller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveTunables {
    pub turn_to_angle: TurnToAngleTunables,
    pub drive_from_tag: DriveFromTagTunables,
}

impl DriveTunables {
    /// External tunable names, in dashboard order.
    pub const NAMES: [&'static str; 7] = [
        "turn_to_angle_kP",
        "turn_to_angle_kI",
        "turn_to_angle_kD",
        "turn_to_angle_tolerancePos",
        "turn_to_angle_toleranceVel",
        "drive_from_tag_kP",
        "drive_from_tag_setpoint",
    ];

    fn slot_mut(&mut self, name: &str) -> Option<&mut f64> {
        let t = &mut self.turn_to_angle;
        let d = &mut self.drive_from_tag;
        Some(match name {
            "turn_to_angle_kP" => &mut t.kp,
            "turn_to_angle_kI" => &mut t.ki,
            "turn_to_angle_kD" => &mut t.kd,
            "turn_to_angle_tolerancePos" => &mut t.tolerance_pos,
            "turn_to_angle_toleranceVel" => &mut t.tolerance_vel,
            "drive_from_tag_kP" => &mut d.kp,
            "drive_from_tag_setpoint" => &mut d.setpoint,
            _ => return None,
        })
    }

    /// Read a tunable by its external name.
    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        let mut copy = *self;
        copy.slot_mut(name).map(|v| *v)
    }

    /// Write a tunable by its external name.
    ///
    /// # Errors
    ///
    /// - `DriveError::UnknownTunable` if `name` is not one of [`Self::NAMES`]
    /// - `DriveError::InvalidTunable` if `value` is not finite, or a
    ///   tolerance is negative
    pub fn set_by_name(&mut self, name: &str, value: f64) -> Result<(), DriveError> {
        let invalid = !value.is_finite() || (name.contains("tolerance") && value < 0.0);
        let slot = self
            .slot_mut(name)
            .ok_or_else(|| DriveError::UnknownTunable(name.to_string()))?;
        if invalid {
            return Err(DriveError::InvalidTunable {
                name: name.to_string(),
                value,
            });
        }
        *slot = value;
        Ok(())
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in Self::NAMES {
            let value = self.get_by_name(name).unwrap_or(f64::NAN);
            if !value.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "tunable {name} must be finite, got {value}"
                )));
            }
        }
        let t = &self.turn_to_angle;
        if t.tolerance_pos < 0.0 || t.tolerance_vel < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "turn_to_angle tolerances must be >= 0 (pos={}, vel={})",
                t.tolerance_pos, t.tolerance_vel
            )));
        }
        Ok(())
    }
}
