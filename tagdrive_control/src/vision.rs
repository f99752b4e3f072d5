//! Vision measurement conditioning.
//!
//! Noisy, intermittent per-cycle detections go through a per-axis median
//! window and a drought counter that debounces target loss.

pub mod estimator;
pub mod median;
