//! # Tagdrive Control
//!
//! Periodic closed-loop controller for a differential-drive robot that
//! steers by gyro heading and AprilTag detections.
//!
//! ## Pipeline (one cycle)
//!
//! 1. **Vision**: raw detection → per-axis median filters + drought debounce
//! 2. **State machine**: operator entry call selects the behavior
//! 3. **Controllers**: continuous heading PID and distance P, clamped
//! 4. **Drivetrain**: arcade mixing into four motor controllers
//!
//! Everything runs single-threaded inside one tick. Tunable gains are the
//! only state written from outside the loop; they are re-read every cycle.

pub mod control;
pub mod cycle;
pub mod drivetrain;
pub mod feedback;
pub mod sensors;
pub mod sim;
pub mod state;
pub mod teleop;
pub mod tunables;
pub mod vision;
