//! Numeric output shaping: saturation, deadband and response curves.
//!
//! `curve` builds a closure; the deadband check happens before the
//! mapping, so a deadbanded input yields exactly `offset` even when the
//! offset is nonzero (idle-output biasing).

use tagdrive_common::drive::config::{CurveShape, TeleopConfig};

/// Restrict `value` to the inclusive range `[lo, hi]`.
///
/// Callers guarantee `lo <= hi`. NaN passes through unchanged so the
/// actuation sink can reject it.
#[inline]
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return value;
    }
    value.max(lo).min(hi)
}

/// Build a response curve around `mapping`.
///
/// - `|input| < deadband` → `offset`
/// - otherwise `mapping(input) + offset`, clamped to `±max_mag`
///   unless `max_mag == 0`
pub fn curve<M>(mapping: M, offset: f64, deadband: f64, max_mag: f64) -> impl Fn(f64) -> f64
where
    M: Fn(f64) -> f64,
{
    move |input| {
        if input.abs() < deadband {
            return offset;
        }
        let output = mapping(input) + offset;
        if max_mag == 0.0 {
            output
        } else {
            clamp(output, -max_mag, max_mag)
        }
    }
}

/// `scalar * x`
pub fn linear_curve(scalar: f64, offset: f64, deadband: f64, max_mag: f64) -> impl Fn(f64) -> f64 {
    curve(move |x| scalar * x, offset, deadband, max_mag)
}

/// `scalar * x * |x|` (finer control near zero, sign preserved).
pub fn ollie_curve(scalar: f64, offset: f64, deadband: f64, max_mag: f64) -> impl Fn(f64) -> f64 {
    curve(move |x| scalar * x * x.abs(), offset, deadband, max_mag)
}

/// `scalar * x^3`
pub fn cubic_curve(scalar: f64, offset: f64, deadband: f64, max_mag: f64) -> impl Fn(f64) -> f64 {
    curve(move |x| scalar * x.powi(3), offset, deadband, max_mag)
}

/// Boxed curve selected from configuration.
pub type BoxedCurve = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// Build the teleop curve named in `cfg`.
pub fn curve_from_config(cfg: &TeleopConfig) -> BoxedCurve {
    let (s, o, d, m) = (cfg.scalar, cfg.offset, cfg.deadband, cfg.max_mag);
    match cfg.curve {
        CurveShape::Linear => Box::new(linear_curve(s, o, d, m)),
        CurveShape::Ollie => Box::new(ollie_curve(s, o, d, m)),
        CurveShape::Cubic => Box::new(cubic_curve(s, o, d, m)),
    }
}
