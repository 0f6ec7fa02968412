use serde::{Deserialize, Serialize};
use std::fmt;

/// Telephony state of a single call, as reported by the call source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Idle,
    Incoming,
    Dialing,
    Active,
    OnHold,
    Disconnecting,
    Disconnected,
}

impl CallState {
    /// Whether the call still occupies the phone (anything but idle or gone)
    pub fn is_live(self) -> bool {
        !matches!(self, CallState::Idle | CallState::Disconnected)
    }
}

/// Point-in-time view of one call from the call list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub number: String,
    pub state: CallState,
    pub created_at_ms: i64,
}

impl CallSnapshot {
    pub fn new(number: impl Into<String>, state: CallState, created_at_ms: i64) -> Self {
        Self {
            number: number.into(),
            state,
            created_at_ms,
        }
    }

    pub fn identity(&self) -> CallIdentity {
        CallIdentity::new(self.number.clone(), self.created_at_ms)
    }

    /// Same call as `other`, regardless of state
    pub fn is_same_call(&self, other: &CallSnapshot) -> bool {
        self.number == other.number && self.created_at_ms == other.created_at_ms
    }
}

/// Names a call for recording purposes, independent of recording attempts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallIdentity {
    pub phone_number: String,
    pub call_creation_time_ms: i64,
}

impl CallIdentity {
    pub fn new(phone_number: impl Into<String>, call_creation_time_ms: i64) -> Self {
        Self {
            phone_number: phone_number.into(),
            call_creation_time_ms,
        }
    }

    /// Coarse match used for hold/disconnect handling: number only
    pub fn matches_number(&self, number: &str) -> bool {
        self.phone_number == number
    }
}

impl fmt::Display for CallIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.phone_number, self.call_creation_time_ms)
    }
}

/// First call currently in the `Active` state, if any
pub fn active_call(calls: &[CallSnapshot]) -> Option<&CallSnapshot> {
    calls.iter().find(|c| c.state == CallState::Active)
}
