//! Error taxonomy and status flags for drive control.
//!
//! - Range violations at the actuation boundary are errors ([`DriveError`]).
//! - A missing vision target is not an error; it is `None` from the estimator.
//! - Configuration problems are [`ConfigError`](crate::config::ConfigError)s
//!   raised before the control loop starts.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised inside a control tick.
///
/// Each variant is a contract violation by the caller or an upstream
/// controller, never an expected degraded condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriveError {
    /// Actuation command outside [-1, 1].
    #[error("improper value for {axis} entered: {value}")]
    RangeViolation {
        /// `"forward"` or `"turn"`.
        axis: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Live update of a tunable name that does not exist.
    #[error("unknown tunable: {0}")]
    UnknownTunable(String),

    /// Live update with a non-finite or out-of-range value.
    #[error("invalid value {value} for tunable {name}")]
    InvalidTunable {
        /// Tunable name.
        name: String,
        /// Rejected value.
        value: f64,
    },
}

bitflags! {
    /// Per-cycle drive status reported in telemetry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DriveStatus: u8 {
        /// The estimator currently reports a target.
        const HAS_TARGET  = 0x01;
        /// The heading controller is within tolerance.
        const AT_SETPOINT = 0x02;
        /// The state machine is in a non-idle behavior.
        const EXECUTING   = 0x04;
        /// Teleop owned the actuation this cycle.
        const TELEOP      = 0x08;
        /// The tick raised a `DriveError`.
        const FAULT       = 0x10;
    }
}
