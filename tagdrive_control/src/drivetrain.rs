//! Actuation side: motor controllers and the differential drivetrain.
//!
//! The state machine only sees [`ActuationSink`]; the drivetrain turns the
//! normalized (forward, turn) pair into per-side motor outputs once per
//! cycle.

pub mod differential;
pub mod motor;

use tagdrive_common::drive::error::DriveError;

/// Accepts normalized arcade commands.
pub trait ActuationSink {
    /// Command `forward` and `turn`, both in [-1, 1].
    ///
    /// # Errors
    ///
    /// `DriveError::RangeViolation` if either value is outside [-1, 1]
    /// (or NaN). Nothing is written in that case.
    fn arcade_drive(&mut self, forward: f64, turn: f64) -> Result<(), DriveError>;

    /// Command zero on both axes.
    fn stop(&mut self);
}

/// Check one arcade axis against [-1, 1].
pub(crate) fn check_range(axis: &'static str, value: f64) -> Result<f64, DriveError> {
    if (-1.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DriveError::RangeViolation { axis, value })
    }
}
