//! Active behavior tag of the drive-control state machine.

use serde::{Deserialize, Serialize};

/// Behavior currently selected by the drive-control state machine.
///
/// Only the engage/force entry operations change the tag; the periodic
/// tick executes whichever tag is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveBehavior {
    /// Commands stop every cycle.
    #[default]
    Idle,
    /// Fixed forward speed, no turn.
    DrivingForward,
    /// Fixed backward speed, no turn.
    DrivingBackward,
    /// Heading PID against the gyro.
    TurningToAngle,
    /// Distance P-control against the target standoff.
    DrivingFromTag,
    /// Heading and distance control toward a tag at the same time.
    FollowingTag,
}

impl ActiveBehavior {
    /// Stable snake_case name (logs, telemetry).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DrivingForward => "driving_forward",
            Self::DrivingBackward => "driving_backward",
            Self::TurningToAngle => "turning_to_angle",
            Self::DrivingFromTag => "driving_from_tag",
            Self::FollowingTag => "following_tag",
        }
    }
}

impl std::fmt::Display for ActiveBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
