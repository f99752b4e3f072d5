//! Sensor-side collaborators: the vision source and the heading sensor.
//!
//! Both are pulled once per cycle by the cycle runner. Implementations
//! must not block.

/// One fiducial detection reported by the vision pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Fiducial (tag) id.
    pub fiducial_id: i32,
    /// Camera-to-target translation [m] (x forward, y left, z up).
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Capture-to-publish latency [s].
    pub latency_s: f64,
}

/// Per-cycle source of the best current detection.
pub trait VisionSource {
    /// Latest detection, or `None` when no tag is visible this cycle.
    fn latest_detection(&mut self) -> Option<Detection>;
}

/// Gyroscope.
pub trait HeadingSensor {
    /// Cumulative angle [deg], clockwise positive, not wrapped.
    fn angle_degrees(&self) -> f64;

    /// Angular rate [deg/s], clockwise positive.
    fn angular_rate_dps(&self) -> f64;
}

/// Fixed heading, useful for bench tests and replay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedHeading {
    pub angle_deg: f64,
    pub rate_dps: f64,
}

impl HeadingSensor for FixedHeading {
    fn angle_degrees(&self) -> f64 {
        self.angle_deg
    }

    fn angular_rate_dps(&self) -> f64 {
        self.rate_dps
    }
}

/// Replays a scripted detection sequence, then reports nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedVision {
    frames: std::collections::VecDeque<Option<Detection>>,
}

impl ScriptedVision {
    pub fn new(frames: impl IntoIterator<Item = Option<Detection>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Frames not yet consumed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl VisionSource for ScriptedVision {
    fn latest_detection(&mut self) -> Option<Detection> {
        self.frames.pop_front().flatten()
    }
}
