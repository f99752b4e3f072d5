//! Control engine root.
//!
//! Output shaping, the continuous-input heading PID, the distance P
//! controller and the geometric heading correction. Each piece is a plain
//! value type mutated only by the control tick.

pub mod distance;
pub mod geometry;
pub mod pid;
pub mod shaping;
