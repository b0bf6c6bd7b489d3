//! Call value objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Call state as reported by the telephony stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    /// No call, or not yet known
    Idle,
    /// Ringing, waiting for the user to answer
    Incoming,
    /// Dialing out, remote side not answered yet
    Outgoing,
    /// Connected and in the foreground
    Active,
    /// Connected but on hold
    Background,
    /// Hang-up in progress
    Disconnecting,
    /// Ended; kept briefly so the user can see it
    Disconnected,
}

impl CallState {
    /// Check if state transition is valid
    pub fn can_transition_to(&self, new_state: &CallState) -> bool {
        use CallState::*;

        match (self, new_state) {
            (a, b) if a == b => true,

            // Idle calls have not been classified yet
            (Idle, _) => true,

            (Incoming, Active) | (Incoming, Background) => true,
            (Outgoing, Active) => true,
            (Active, Background) => true,
            (Background, Active) => true,

            (Incoming | Outgoing | Active | Background, Disconnecting | Disconnected) => true,
            (Disconnecting, Disconnected) => true,

            // Can't leave Disconnected
            (Disconnected, _) => false,

            _ => false,
        }
    }

    /// Whether the call has a live connection the user can end.
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            CallState::Incoming | CallState::Outgoing | CallState::Active | CallState::Background
        )
    }

    pub fn is_dialing(&self) -> bool {
        matches!(self, CallState::Outgoing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Idle => "idle",
            CallState::Incoming => "incoming",
            CallState::Outgoing => "outgoing",
            CallState::Active => "active",
            CallState::Background => "background",
            CallState::Disconnecting => "disconnecting",
            CallState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a call ended
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectCause {
    /// Call has not disconnected
    #[default]
    NotValid,
    /// Local party hung up
    Local,
    /// Remote party hung up
    Remote,
    Busy,
    Rejected,
    Error(String),
}

/// Capability bits advertised for a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CallCapabilities(u32);

impl CallCapabilities {
    pub const NONE: CallCapabilities = CallCapabilities(0);
    pub const HOLD: CallCapabilities = CallCapabilities(0x1);
    pub const MERGE_CONFERENCE: CallCapabilities = CallCapabilities(0x4);
    /// Conference should be shown with provider-agnostic UI
    pub const GENERIC_CONFERENCE: CallCapabilities = CallCapabilities(0x40);

    pub const fn contains(&self, other: CallCapabilities) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CallCapabilities {
    type Output = CallCapabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        CallCapabilities(self.0 | rhs.0)
    }
}

/// Overall in-call screen state, derived from the set of calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InCallState {
    NoCalls,
    Incoming,
    Outgoing,
    InCall,
}
