//! Debounced, smoothed target estimate.
//!
//! Each axis (x, y, z) runs through its own [`MedianFilter`]. The fiducial
//! id and latency are stored raw. A drought counter counts cycles since the
//! last real detection; the target is reported present while
//! `drought < filter_window`, so one missed frame does not register as a
//! lost target.
//!
//! Accessors return `None` (not zero) while no target is present.

use nalgebra::Vector3;
use tracing::{debug, trace};

use super::median::MedianFilter;
use crate::control::geometry::bearing_degrees;
use crate::sensors::Detection;

/// Target estimator owned by the cycle runner.
#[derive(Debug, Clone)]
pub struct TargetEstimator {
    filter_window: usize,
    x_filter: MedianFilter,
    y_filter: MedianFilter,
    z_filter: MedianFilter,
    x: f64,
    y: f64,
    z: f64,
    id: i32,
    latency_s: f64,
    /// Cycles since the last detection, saturating at `filter_window`.
    drought: usize,
}

impl TargetEstimator {
    /// Create an estimator that starts with no target.
    pub fn new(filter_window: usize) -> Self {
        let x_filter = MedianFilter::new(filter_window);
        let filter_window = x_filter.window();
        Self {
            filter_window,
            y_filter: MedianFilter::new(filter_window),
            z_filter: MedianFilter::new(filter_window),
            x_filter,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            id: 0,
            latency_s: 0.0,
            drought: filter_window,
        }
    }

    pub fn filter_window(&self) -> usize {
        self.filter_window
    }

    /// Cycles since the last real detection (saturating).
    pub fn drought(&self) -> usize {
        self.drought
    }

    /// Per-cycle update with this cycle's detection, if any.
    pub fn update(&mut self, detection: Option<Detection>) {
        match detection {
            Some(d) => {
                if !self.has_targets() {
                    debug!(id = d.fiducial_id, "target acquired");
                }
                self.drought = 0;
                self.x = self.x_filter.calculate(d.x);
                self.y = self.y_filter.calculate(d.y);
                self.z = self.z_filter.calculate(d.z);
                self.id = d.fiducial_id;
                self.latency_s = d.latency_s;
            }
            None => {
                let was_present = self.has_targets();
                self.drought = (self.drought + 1).min(self.filter_window);
                trace!(drought = self.drought, "no detection");
                if was_present && !self.has_targets() {
                    debug!(id = self.id, "target lost");
                }
            }
        }
    }

    /// `drought < filter_window`
    pub fn has_targets(&self) -> bool {
        self.drought < self.filter_window
    }

    fn gated<T>(&self, value: T) -> Option<T> {
        self.has_targets().then_some(value)
    }

    /// Filtered camera-to-target x [m].
    pub fn x(&self) -> Option<f64> {
        self.gated(self.x)
    }

    /// Filtered camera-to-target y [m].
    pub fn y(&self) -> Option<f64> {
        self.gated(self.y)
    }

    /// Filtered camera-to-target z [m].
    pub fn z(&self) -> Option<f64> {
        self.gated(self.z)
    }

    /// Fiducial id of the last detection.
    pub fn id(&self) -> Option<i32> {
        self.gated(self.id)
    }

    /// Pipeline latency of the last detection [s].
    pub fn latency(&self) -> Option<f64> {
        self.gated(self.latency_s)
    }

    /// Filtered camera-to-target vector.
    pub fn camera_to_target(&self) -> Option<Vector3<f64>> {
        self.gated(Vector3::new(self.x, self.y, self.z))
    }

    /// Simple bearing to the target [deg], `atan2(-y, x)`.
    pub fn heading_degrees(&self) -> Option<f64> {
        self.gated(bearing_degrees(self.x, self.y))
    }

    /// Forget all samples and report no target (robot disabled).
    pub fn reset(&mut self) {
        self.x_filter.reset();
        self.y_filter.reset();
        self.z_filter.reset();
        self.drought = self.filter_window;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
