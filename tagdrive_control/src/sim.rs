//! Simulated plant: differential-drive kinematics, gyro and a tag camera.
//!
//! World frame is planar (x, y) with z up. The robot yaw is
//! counter-clockwise positive; the gyro reports the clockwise-positive
//! cumulative angle. The camera looks along robot +x from
//! `camera_offset`; the drive's positive forward axis points the other
//! way.

use std::collections::VecDeque;

use nalgebra::{Rotation2, Vector2};
use tagdrive_common::drive::config::SimConfig;
use tracing::trace;

use crate::drivetrain::differential::WheelSpeeds;
use crate::sensors::{Detection, HeadingSensor, VisionSource};

/// Kinematic robot with a gyro and a fiducial camera.
#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    cfg: SimConfig,
    camera_offset: Vector2<f64>,
    camera_height: f64,
    position: Vector2<f64>,
    /// Gyro angle [deg], clockwise positive.
    angle_deg: f64,
    /// Gyro rate [deg/s], clockwise positive.
    rate_dps: f64,
    frame: u64,
    /// Frames still inside the pipeline.
    pipeline: VecDeque<Option<Detection>>,
    pipeline_delay: usize,
}

impl SimulatedRobot {
    /// Robot at the origin facing `cfg.initial_heading_deg`.
    ///
    /// The reported detections lag by `latency_s` rounded to whole cycles.
    pub fn new(cfg: &SimConfig, camera_offset: [f64; 3], period_s: f64) -> Self {
        let pipeline_delay = if period_s > 0.0 {
            (cfg.latency_s / period_s).round() as usize
        } else {
            0
        };
        Self {
            cfg: cfg.clone(),
            camera_offset: Vector2::new(camera_offset[0], camera_offset[1]),
            camera_height: camera_offset[2],
            position: Vector2::zeros(),
            angle_deg: cfg.initial_heading_deg,
            rate_dps: 0.0,
            frame: 0,
            pipeline: VecDeque::with_capacity(pipeline_delay + 1),
            pipeline_delay,
        }
    }

    pub fn position(&self) -> Vector2<f64> {
        self.position
    }

    /// Counter-clockwise yaw [rad].
    fn yaw(&self) -> f64 {
        -self.angle_deg.to_radians()
    }

    /// Integrate one cycle of logical wheel speeds (before side inversion).
    pub fn step(&mut self, speeds: WheelSpeeds, dt: f64) {
        let drive = (speeds.left + speeds.right) / 2.0 * self.cfg.max_speed_mps;
        let ccw_dps = (speeds.right - speeds.left) / 2.0 * self.cfg.max_turn_rate_dps;

        let heading = Rotation2::new(self.yaw());
        self.position += heading * Vector2::new(-drive, 0.0) * dt;
        self.rate_dps = -ccw_dps;
        self.angle_deg += self.rate_dps * dt;
    }

    /// Tag position in the camera frame, if it is inside range and FOV.
    pub fn observe(&self) -> Option<Detection> {
        let [tx, ty, tz] = self.cfg.tag_position;
        let to_body = Rotation2::new(self.yaw()).inverse();
        let tag = to_body * (Vector2::new(tx, ty) - self.position) - self.camera_offset;

        let range = tag.norm();
        let bearing = tag.y.atan2(tag.x).to_degrees();
        if tag.x <= 0.0
            || range > self.cfg.detection_range_m
            || bearing.abs() > self.cfg.half_fov_deg
        {
            return None;
        }
        Some(Detection {
            fiducial_id: self.cfg.tag_id,
            x: tag.x,
            y: tag.y,
            z: tz - self.camera_height,
            latency_s: self.cfg.latency_s,
        })
    }
}

impl HeadingSensor for SimulatedRobot {
    fn angle_degrees(&self) -> f64 {
        self.angle_deg
    }

    fn angular_rate_dps(&self) -> f64 {
        self.rate_dps
    }
}

impl VisionSource for SimulatedRobot {
    fn latest_detection(&mut self) -> Option<Detection> {
        self.frame += 1;
        let dropped = self.cfg.dropout_every > 0
            && self.frame % u64::from(self.cfg.dropout_every) == 0;
        let captured = if dropped { None } else { self.observe() };
        if dropped {
            trace!(frame = self.frame, "simulated frame dropped");
        }

        self.pipeline.push_back(captured);
        if self.pipeline.len() > self.pipeline_delay {
            self.pipeline.pop_front().flatten()
        } else {
            None
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
