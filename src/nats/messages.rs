use crate::call::CallSnapshot;
use crate::recording::RecordingRecord;
use serde::{Deserialize, Serialize};

/// Body of requests that carry no arguments (`stop`, `status`, `active`)
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EmptyRequest {}

/// Request body for `<prefix>.start`
#[derive(Debug, Serialize, Deserialize)]
pub struct StartRequest {
    pub phone_number: String,
    pub call_start_time_ms: i64,
}

/// Reply to `<prefix>.start`
#[derive(Debug, Serialize, Deserialize)]
pub struct StartReply {
    pub success: bool,
}

/// Reply to `<prefix>.stop` and `<prefix>.active`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecordingReply {
    #[serde(default)]
    pub recording: Option<RecordingRecord>,
}

/// Reply to `<prefix>.status`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusReply {
    pub recording: bool,
}

/// Call-state event published by the telephony side on the call subject
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallEventMessage {
    CallListChanged { calls: Vec<CallSnapshot> },
    CallDisconnected { call: CallSnapshot },
}
