//! Proportional standoff controller.
//!
//! `output = (setpoint - measured) * kp`, passed to actuation without
//! negation. The drivetrain's positive forward axis points away from the
//! camera, so a positive error (setpoint beyond the measurement) backs the
//! robot away from the tag and a negative one closes in. `drive_from_tag`
//! and `follow_tag` both use this sign.

/// Stateless P controller over a scalar distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceController {
    kp: f64,
    setpoint: f64,
}

impl DistanceController {
    pub const fn new(kp: f64, setpoint: f64) -> Self {
        Self { kp, setpoint }
    }

    pub fn set_gain(&mut self, kp: f64) {
        self.kp = kp;
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// `(setpoint - measured) * kp`
    #[inline]
    pub fn calculate(&self, measured: f64) -> f64 {
        (self.setpoint - measured) * self.kp
    }
}
