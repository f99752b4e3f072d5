//! Drive-control shared types.
//!
//! Configuration, live tunables, the behavior tag, status flags and the
//! error taxonomy used by the control crate and its tooling.

pub mod behavior;
pub mod config;
pub mod error;
pub mod tunables;
