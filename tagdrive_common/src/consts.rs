//! System-wide constants for the tagdrive workspace.
//!
//! Single source of truth for numeric limits and defaults.

use static_assertions::const_assert;

/// Magnitude limit applied to every controller output before actuation.
pub const DRIVE_OUTPUT_LIMIT: f64 = 0.3;

/// Forward command used by the fixed-speed behaviors.
pub const FIXED_DRIVE_SPEED: f64 = 0.3;

/// Lower bound of the continuous heading domain [deg].
pub const HEADING_MIN_DEG: f64 = 0.0;

/// Upper bound of the continuous heading domain [deg].
pub const HEADING_MAX_DEG: f64 = 360.0;

/// Largest median window the estimator can hold (fixed storage).
pub const MAX_FILTER_WINDOW: usize = 64;

/// Default median window size.
pub const DEFAULT_FILTER_WINDOW: usize = 10;

/// Default control period [ms].
pub const DEFAULT_CYCLE_TIME_MS: u32 = 20;

/// Control period bounds [ms].
pub const CYCLE_TIME_MS_MIN: u32 = 1;
pub const CYCLE_TIME_MS_MAX: u32 = 1000;

/// Fiducial id that engages forward driving under tag control.
pub const TAG_ID_FORWARD: i32 = 1;

/// Fiducial id that engages backward driving under tag control.
pub const TAG_ID_BACKWARD: i32 = 2;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/drive.toml";

const_assert!(MAX_FILTER_WINDOW >= 1);
const_assert!(DEFAULT_FILTER_WINDOW <= MAX_FILTER_WINDOW);
const_assert!(DEFAULT_CYCLE_TIME_MS >= CYCLE_TIME_MS_MIN);
const_assert!(TAG_ID_FORWARD != TAG_ID_BACKWARD);
