//! Drive-control configuration loaded from TOML.
//!
//! Optional sections fall back to the defaults the robot was tuned with.
//! `[drivetrain]` is mandatory: the motor-controller family must be named
//! explicitly, and an unknown family is rejected at parse time.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::tunables::DriveTunables;
use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    CYCLE_TIME_MS_MAX, CYCLE_TIME_MS_MIN, DEFAULT_CYCLE_TIME_MS, DEFAULT_FILTER_WINDOW,
    MAX_FILTER_WINDOW,
};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete drive-control configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    pub drivetrain: DrivetrainConfig,
    #[serde(default)]
    pub tunables: DriveTunables,
    #[serde(default)]
    pub teleop: TeleopConfig,
    #[serde(default)]
    pub sim: SimConfig,
}

impl DriveConfig {
    /// Run every section's validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.control.validate()?;
        self.vision.validate()?;
        self.drivetrain.validate()?;
        self.tunables.validate()?;
        self.teleop.validate()?;
        self.sim.validate()?;
        Ok(())
    }
}

// ─── Control ────────────────────────────────────────────────────────

/// How `turn_to_tag` / `follow_tag` derive the heading correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingCorrection {
    /// Camera-offset aware geometry with latency compensation.
    #[default]
    Geometric,
    /// Plain `atan2(-y, x)` bearing from the estimator.
    Bearing,
}

/// Entry call issued every cycle while the operator holds the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerAction {
    TurnToAngle {
        #[serde(default)]
        angle: Option<f64>,
    },
    TurnToTag,
    DriveFromTag {
        #[serde(default)]
        distance: Option<f64>,
    },
    FollowTag {
        #[serde(default)]
        distance: Option<f64>,
    },
    TagControl,
}

impl Default for TriggerAction {
    fn default() -> Self {
        Self::FollowTag { distance: None }
    }
}

/// Control loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Control period [ms].
    pub cycle_time_ms: u32,
    /// Telemetry emission interval [cycles].
    pub feedback_interval: u32,
    /// Behavior engaged while the trigger is held.
    pub trigger_action: TriggerAction,
    /// Heading-correction variant.
    pub heading_correction: HeadingCorrection,
    /// Robot-center to camera vector [m] (x forward, y left, z up).
    pub camera_offset: [f64; 3],
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            cycle_time_ms: DEFAULT_CYCLE_TIME_MS,
            feedback_interval: 5,
            trigger_action: TriggerAction::default(),
            heading_correction: HeadingCorrection::default(),
            camera_offset: [0.33, -0.03, 0.0],
        }
    }
}

impl ControlConfig {
    /// Control period [s].
    pub fn period_s(&self) -> f64 {
        f64::from(self.cycle_time_ms) / 1000.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(CYCLE_TIME_MS_MIN..=CYCLE_TIME_MS_MAX).contains(&self.cycle_time_ms) {
            return Err(ConfigError::ValidationError(format!(
                "cycle_time_ms {} out of range [{}, {}]",
                self.cycle_time_ms, CYCLE_TIME_MS_MIN, CYCLE_TIME_MS_MAX
            )));
        }
        if self.feedback_interval == 0 {
            return Err(ConfigError::ValidationError(
                "feedback_interval must be >= 1".to_string(),
            ));
        }
        if self.camera_offset.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "camera_offset must be finite, got {:?}",
                self.camera_offset
            )));
        }
        Ok(())
    }
}

// ─── Vision ─────────────────────────────────────────────────────────

/// Target estimator settings (fixed at construction).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Median window size and drought threshold [cycles].
    pub filter_window: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            filter_window: DEFAULT_FILTER_WINDOW,
        }
    }
}

impl VisionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filter_window == 0 || self.filter_window > MAX_FILTER_WINDOW {
            return Err(ConfigError::ValidationError(format!(
                "filter_window {} out of range [1, {}]",
                self.filter_window, MAX_FILTER_WINDOW
            )));
        }
        Ok(())
    }
}

// ─── Drivetrain ─────────────────────────────────────────────────────

/// Motor-controller family driving all four drivetrain motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControllerType {
    SparkMax,
    TalonFx,
}

/// Behavior of a motor when commanded to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleMode {
    #[default]
    Coast,
    Brake,
}

/// CAN ids and controller family of the differential drivetrain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrivetrainConfig {
    pub front_left_id: u8,
    pub front_right_id: u8,
    pub back_left_id: u8,
    pub back_right_id: u8,
    pub controller_type: ControllerType,
    #[serde(default)]
    pub idle_mode: IdleMode,
}

impl DrivetrainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ids = [
            self.front_left_id,
            self.front_right_id,
            self.back_left_id,
            self.back_right_id,
        ];
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate drivetrain CAN id {id}"
                )));
            }
        }
        Ok(())
    }
}

// ─── Teleop ─────────────────────────────────────────────────────────

/// Response shape applied to joystick axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveShape {
    /// `scalar * x`
    #[default]
    Linear,
    /// `scalar * x * |x|`
    Ollie,
    /// `scalar * x^3`
    Cubic,
}

/// Joystick shaping for manual driving.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleopConfig {
    pub curve: CurveShape,
    pub scalar: f64,
    pub offset: f64,
    pub deadband: f64,
    /// Output magnitude cap (0 = unclamped).
    pub max_mag: f64,
}

impl Default for TeleopConfig {
    fn default() -> Self {
        Self {
            curve: CurveShape::Linear,
            scalar: 0.5,
            offset: 0.0,
            deadband: 0.1,
            max_mag: 1.0,
        }
    }
}

impl TeleopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadband < 0.0 || self.max_mag < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "teleop deadband ({}) and max_mag ({}) must be >= 0",
                self.deadband, self.max_mag
            )));
        }
        if self.max_mag > 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "teleop max_mag {} exceeds actuation range 1.0",
                self.max_mag
            )));
        }
        Ok(())
    }
}

// ─── Simulation ─────────────────────────────────────────────────────

/// Kinematic simulation plant used by the binary and the tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Initial gyro angle [deg].
    pub initial_heading_deg: f64,
    /// Tag position in the world frame [m].
    pub tag_position: [f64; 3],
    /// Fiducial id reported for the tag.
    pub tag_id: i32,
    /// Reported pipeline latency [s].
    pub latency_s: f64,
    /// Maximum detection distance [m].
    pub detection_range_m: f64,
    /// Half field of view [deg].
    pub half_fov_deg: f64,
    /// Forward speed at full command [m/s].
    pub max_speed_mps: f64,
    /// Turn rate at full command [deg/s].
    pub max_turn_rate_dps: f64,
    /// Drop every Nth frame (0 = never).
    pub dropout_every: u32,
    /// Whether the simulated operator holds the trigger.
    pub trigger_held: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_heading_deg: 0.0,
            tag_position: [2.0, 0.5, 0.0],
            tag_id: 3,
            latency_s: 0.03,
            detection_range_m: 5.0,
            half_fov_deg: 35.0,
            max_speed_mps: 3.0,
            max_turn_rate_dps: 360.0,
            dropout_every: 0,
            trigger_held: true,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_speed_mps <= 0.0 || self.max_turn_rate_dps <= 0.0 {
            return Err(ConfigError::ValidationError(
                "sim max_speed_mps and max_turn_rate_dps must be > 0".to_string(),
            ));
        }
        if self.latency_s < 0.0 || self.detection_range_m <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "sim latency_s ({}) must be >= 0 and detection_range_m ({}) > 0",
                self.latency_s, self.detection_range_m
            )));
        }
        if !(0.0..=180.0).contains(&self.half_fov_deg) {
            return Err(ConfigError::ValidationError(format!(
                "sim half_fov_deg {} out of range [0, 180]",
                self.half_fov_deg
            )));
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
