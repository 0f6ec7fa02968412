pub mod call;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod nats;
pub mod recording;
pub mod session;

pub use call::{CallIdentity, CallSnapshot, CallState};
pub use config::Config;
pub use control::{RecordButtonState, ToggleOutcome};
pub use engine::{EngineBinder, EngineClient, EngineLink, EngineTransport, NatsEngineBinder};
pub use error::{RecorderError, RecorderResult};
pub use nats::{CallEventMessage, NatsClient};
pub use recording::{RecordingIndex, RecordingRecord, RecordingStore};
pub use session::{
    CallRecorder, EnabledFlag, RecorderEvent, RecorderHandle, RecorderLoop,
    RecordingProgressListener, SessionConfig, SessionState,
};
