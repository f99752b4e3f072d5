//! Tagdrive Common Library
//!
//! Shared constants, configuration loading and tunable-parameter types for
//! the tagdrive workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Numeric limits and defaults (output limits, filter window bounds)
//! - [`config`] - Configuration loading traits and types
//! - [`drive`] - Drive-control configuration, tunables, behaviors and errors
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use tagdrive_common::prelude::*;
//!
//! let tunables = DriveTunables::default();
//! assert_eq!(tunables.turn_to_angle.kp, 0.025);
//! ```

pub mod config;
pub mod consts;
pub mod drive;
pub mod prelude;
