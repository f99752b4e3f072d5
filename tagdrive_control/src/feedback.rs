//! Per-cycle telemetry snapshot.
//!
//! Emitted every `feedback_interval` cycles as a JSON line through
//! `tracing` by the cycle runner.

use serde::Serialize;
use tagdrive_common::drive::behavior::ActiveBehavior;
use tagdrive_common::drive::error::DriveStatus;

use crate::vision::estimator::TargetEstimator;

/// Telemetry published by the robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Feedback {
    pub cycle: u64,
    pub gyro_angle: f64,
    /// Fiducial id, -1 without a target.
    pub target_id: i32,
    /// Filtered camera-to-target offset, 0 without a target.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Simple bearing to the target [deg], 0 without a target.
    pub heading: f64,
    pub behavior: ActiveBehavior,
    pub forward: f64,
    pub turn: f64,
    pub status: DriveStatus,
}

impl Feedback {
    /// Collect the estimator-side fields; the rest is filled by the caller.
    pub fn from_estimator(cycle: u64, gyro_angle: f64, estimator: &TargetEstimator) -> Self {
        let mut status = DriveStatus::empty();
        status.set(DriveStatus::HAS_TARGET, estimator.has_targets());
        Self {
            cycle,
            gyro_angle,
            target_id: estimator.id().unwrap_or(-1),
            x: estimator.x().unwrap_or(0.0),
            y: estimator.y().unwrap_or(0.0),
            z: estimator.z().unwrap_or(0.0),
            heading: estimator.heading_degrees().unwrap_or(0.0),
            behavior: ActiveBehavior::Idle,
            forward: 0.0,
            turn: 0.0,
            status,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
