use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Tunables of the session manager
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between elapsed-time ticks while recording
    /// Default: 500 ms
    pub progress_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_millis(500),
        }
    }
}

/// Externally controlled "call recording enabled" switch.
///
/// Read once per bind attempt; flipping it does not affect a session that is
/// already running.
#[derive(Debug, Clone, Default)]
pub struct EnabledFlag(Arc<AtomicBool>);

impl EnabledFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}
