//! Drive-control state machine module root.

pub mod machine;

pub use machine::{DriveControl, EngageResult};
