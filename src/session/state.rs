use crate::call::CallIdentity;
use chrono::{DateTime, Utc};
use std::fmt;
use tokio::time::Instant;
use uuid::Uuid;

/// Lifecycle of the (single) recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active,
    Stopping,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contiguous recording attempt tied to a single call
#[derive(Debug, Clone)]
pub struct RecordingSession {
    /// Log correlation id
    pub id: Uuid,
    pub identity: CallIdentity,
    pub started_at: DateTime<Utc>,
    pub state: SessionState,
    started: Instant,
}

impl RecordingSession {
    pub fn start(identity: CallIdentity) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            started_at: Utc::now(),
            state: SessionState::Active,
            started: Instant::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Milliseconds since the engine accepted the start
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
