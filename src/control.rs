//! In-call record button behavior

use crate::call::{active_call, CallSnapshot};
use crate::session::RecorderHandle;
use tracing::info;

/// What the record button should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordButtonState {
    /// No active call to record
    Hidden,
    Record,
    Stop,
}

/// Result of a button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    /// Engine refused; the caller shows a transient notice
    StartFailed,
    Stopped,
    NoActiveCall,
}

/// Button state from the current calls and last-known recording status
pub fn button_state(calls: &[CallSnapshot], is_recording: bool) -> RecordButtonState {
    match active_call(calls) {
        None => RecordButtonState::Hidden,
        Some(_) if is_recording => RecordButtonState::Stop,
        Some(_) => RecordButtonState::Record,
    }
}

/// Stop if recording, otherwise start recording the active call
pub async fn toggle_recording(recorder: &RecorderHandle, calls: &[CallSnapshot]) -> ToggleOutcome {
    if recorder.is_recording().await {
        recorder.finish_recording().await;
        return ToggleOutcome::Stopped;
    }

    let Some(call) = active_call(calls) else {
        return ToggleOutcome::NoActiveCall;
    };

    if recorder.start_recording(call.identity()).await {
        ToggleOutcome::Started
    } else {
        info!("Recording of {} could not be started", call.number);
        ToggleOutcome::StartFailed
    }
}

/// Elapsed recording time as `m:ss`, or `h:mm:ss` past the hour
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let total_secs = elapsed_ms / 1000;
    let (hours, minutes, seconds) = (total_secs / 3600, (total_secs / 60) % 60, total_secs % 60);

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
