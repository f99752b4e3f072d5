//! Heading correction that squares the robot to a detected tag.
//!
//! The camera is not at the robot's rotation center, so the bearing seen by
//! the camera is not the angle the robot must turn. With `rc` the
//! robot-to-camera vector and `ct` the camera-to-tag vector, the robot-to-tag
//! vector is `rt = rc + ct` and the correction is the angle between `rc` and
//! `rt`, signed by `(rt × rc).z`.

use nalgebra::Vector3;

/// Norms below this are treated as zero-length.
const MIN_NORM: f64 = 1e-9;

/// Signed angle [deg] between `rc` and `rc + ct`.
///
/// Positive when `(rt × rc).z > 0`, negative when `< 0`, zero when the
/// vectors are collinear or either one has zero length.
pub fn adjust_heading(rc: &Vector3<f64>, ct: &Vector3<f64>) -> f64 {
    let rt = rc + ct;
    let denom = rc.norm() * rt.norm();
    if denom < MIN_NORM {
        return 0.0;
    }
    let cos = (rc.dot(&rt) / denom).clamp(-1.0, 1.0);
    let theta = cos.acos().to_degrees();

    let d = rt.cross(rc).z;
    if d > 0.0 {
        theta
    } else if d < 0.0 {
        -theta
    } else {
        0.0
    }
}

/// Simple bearing [deg] to a camera-relative point: `atan2(-y, x)`.
#[inline]
pub fn bearing_degrees(x: f64, y: f64) -> f64 {
    (-y).atan2(x).to_degrees()
}

/// Per-cycle inputs of the latency-compensated correction.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionInput {
    /// Camera-to-tag vector [m].
    pub camera_to_tag: Vector3<f64>,
    /// Vision pipeline latency [s].
    pub latency_s: f64,
    /// Current gyro rate [deg/s].
    pub angular_rate_dps: f64,
    /// Heading controller already inside its tolerance band.
    pub settled: bool,
}

/// Geometric correction minus the heading change accumulated during the
/// pipeline latency. Returns 0 once the heading controller is settled so
/// estimation noise cannot re-trigger a turn.
pub fn compensated_correction(robot_to_camera: &Vector3<f64>, input: &CorrectionInput) -> f64 {
    if input.settled {
        return 0.0;
    }
    adjust_heading(robot_to_camera, &input.camera_to_tag)
        - input.latency_s * input.angular_rate_dps
}
