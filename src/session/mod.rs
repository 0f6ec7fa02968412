//! Recording session management
//!
//! This module provides the call-driven recording lifecycle:
//! - `CallRecorder`: state machine reacting to call and engine events
//! - `RecorderLoop` / `RecorderHandle`: single-owner event loop and its handle
//! - `ProgressNotifier`: elapsed-time ticks while a session is active

mod config;
mod events;
mod handle;
mod manager;
mod progress;
mod state;

pub use config::{EnabledFlag, SessionConfig};
pub use events::{Command, RecorderEvent};
pub use handle::{RecorderHandle, RecorderLoop};
pub use manager::CallRecorder;
pub use progress::{ProgressNotifier, RecordingProgressListener};
pub use state::{RecordingSession, SessionState};
