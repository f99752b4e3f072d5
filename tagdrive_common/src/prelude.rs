//! Prelude module for common re-exports.
//!
//! ```rust
//! use tagdrive_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::drive::config::{
    ControlConfig, ControllerType, CurveShape, DriveConfig, DrivetrainConfig, HeadingCorrection,
    IdleMode, SimConfig, TeleopConfig, TriggerAction, VisionConfig,
};

// ─── Drive control ──────────────────────────────────────────────────
pub use crate::drive::behavior::ActiveBehavior;
pub use crate::drive::error::{DriveError, DriveStatus};
pub use crate::drive::tunables::{DriveFromTagTunables, DriveTunables, TurnToAngleTunables};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DRIVE_OUTPUT_LIMIT, FIXED_DRIVE_SPEED, MAX_FILTER_WINDOW};
