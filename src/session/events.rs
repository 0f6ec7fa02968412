use super::progress::RecordingProgressListener;
use crate::call::{CallIdentity, CallSnapshot};
use crate::engine::EngineTransport;
use crate::recording::RecordingRecord;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Everything the recorder loop reacts to, in arrival order
pub enum RecorderEvent {
    CallListChanged(Vec<CallSnapshot>),
    CallDisconnected(CallSnapshot),
    EngineConnected {
        epoch: u64,
        transport: Arc<dyn EngineTransport>,
    },
    EngineLost {
        epoch: u64,
    },
    ProgressTick {
        generation: u64,
    },
    Command(Command),
}

impl RecorderEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CallListChanged(_) => "call_list_changed",
            Self::CallDisconnected(_) => "call_disconnected",
            Self::EngineConnected { .. } => "engine_connected",
            Self::EngineLost { .. } => "engine_lost",
            Self::ProgressTick { .. } => "progress_tick",
            Self::Command(_) => "command",
        }
    }
}

/// Requests from the UI layer; replies go back on the embedded oneshot
pub enum Command {
    StartRecording {
        identity: CallIdentity,
        reply: oneshot::Sender<bool>,
    },
    FinishRecording {
        reply: oneshot::Sender<()>,
    },
    IsRecording {
        reply: oneshot::Sender<bool>,
    },
    ActiveSession {
        reply: oneshot::Sender<Option<RecordingRecord>>,
    },
    AddListener(Arc<dyn RecordingProgressListener>),
    Shutdown,
}
