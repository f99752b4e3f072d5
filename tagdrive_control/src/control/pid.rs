//! PID controller with optional continuous input, settle tolerance and a
//! bounded integrator.
//!
//! Gains are replaced every cycle by the caller ([`PidController::set_gains`])
//! so live tuning takes effect on the next tick. The integrator persists
//! across calls until [`PidController::reset`]. Output is unbounded; the
//! caller clamps.

/// PID gains.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (0 = disabled).
    pub ki: f64,
    /// Derivative gain (0 = disabled).
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// Settle band used by [`PidController::at_setpoint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Position band [input units].
    pub position: f64,
    /// Error-rate band [input units / s].
    pub velocity: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            position: 0.05,
            velocity: f64::INFINITY,
        }
    }
}

/// Internal state carried between cycles.
///
/// Must be reset on robot mode transitions so a stale integrator does not
/// kick the next engagement.
#[derive(Debug, Clone, Copy, Default)]
struct PidState {
    /// Integral accumulator (error · s).
    integral: f64,
    /// Last computed error.
    error: f64,
    /// Error of the previous cycle.
    prev_error: f64,
    /// Rate of change of the error.
    velocity_error: f64,
    /// At least one `calculate` since the last reset.
    have_measurement: bool,
}

/// PID controller for a periodic loop with fixed `period`.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    period: f64,
    setpoint: f64,
    have_setpoint: bool,
    /// `(min, max)` of the wrapped input domain, if continuous.
    continuous: Option<(f64, f64)>,
    tolerance: Tolerance,
    /// Bounds on the integral contribution `ki * integral` [output units].
    integrator_range: (f64, f64),
    state: PidState,
}

impl PidController {
    /// Create a controller for a loop running every `period` seconds.
    ///
    /// A non-positive period is replaced by 20 ms.
    pub fn new(gains: PidGains, period: f64) -> Self {
        Self {
            gains,
            period: if period > 0.0 { period } else { 0.02 },
            setpoint: 0.0,
            have_setpoint: false,
            continuous: None,
            tolerance: Tolerance::default(),
            integrator_range: (-1.0, 1.0),
            state: PidState::default(),
        }
    }

    /// Treat `[min, max)` as a circle: the error is taken along the shorter arc.
    pub fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.continuous = Some((min, max));
    }

    /// Set the target. The error is not recomputed until the next `calculate`.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
        self.have_setpoint = true;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Replace the gains; the integrator is kept.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn set_tolerance(&mut self, position: f64, velocity: f64) {
        self.tolerance = Tolerance { position, velocity };
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Last computed error (wrapped when continuous).
    pub fn error(&self) -> f64 {
        self.state.error
    }

    /// Last computed error rate.
    pub fn velocity_error(&self) -> f64 {
        self.state.velocity_error
    }

    /// True when a setpoint is set, a measurement has been taken, and both
    /// the error and its rate are inside the tolerance band.
    pub fn at_setpoint(&self) -> bool {
        self.have_setpoint
            && self.state.have_measurement
            && self.state.error.abs() < self.tolerance.position
            && self.state.velocity_error.abs() < self.tolerance.velocity
    }

    /// Zero the integrator and the error history.
    pub fn reset(&mut self) {
        self.state = PidState::default();
    }

    /// `setpoint - measurement`, wrapped to `[-half, half)` when continuous.
    pub fn compute_error(&self, measurement: f64) -> f64 {
        let raw = self.setpoint - measurement;
        match self.continuous {
            Some((min, max)) => {
                let half = (max - min) / 2.0;
                input_modulus(raw, -half, half)
            }
            None => raw,
        }
    }

    /// One PID step against `measurement`.
    pub fn calculate(&mut self, measurement: f64) -> f64 {
        let g = self.gains;
        let error = self.compute_error(measurement);

        self.state.prev_error = self.state.error;
        self.state.error = error;
        self.state.velocity_error = (error - self.state.prev_error) / self.period;

        if g.ki != 0.0 {
            let a = self.integrator_range.0 / g.ki;
            let b = self.integrator_range.1 / g.ki;
            self.state.integral =
                (self.state.integral + error * self.period).clamp(a.min(b), a.max(b));
        } else {
            self.state.integral = 0.0;
        }
        self.state.have_measurement = true;

        g.kp * error + g.ki * self.state.integral + g.kd * self.state.velocity_error
    }
}

/// Wrap `value` into `[min, max)`.
#[inline]
pub fn input_modulus(value: f64, min: f64, max: f64) -> f64 {
    let modulus = max - min;
    (value - min).rem_euclid(modulus) + min
}

// ─── Tests ──────────────────────────────────────────────────────────
