use crate::nats::{EmptyRequest, NatsClient, RecordingReply, StartReply, StartRequest, StatusReply};
use crate::recording::RecordingRecord;
use anyhow::Result;

/// RPC surface of the out-of-process recording engine
///
/// Implementations:
/// - NATS request/reply (`NatsEngineTransport`)
/// - In-process fakes (tests)
#[async_trait::async_trait]
pub trait EngineTransport: Send + Sync {
    /// Ask the engine to start capturing the given call
    ///
    /// Returns `false` if the engine declined (already recording, no audio source, ...)
    async fn start(&self, phone_number: &str, call_start_time_ms: i64) -> Result<bool>;

    /// Stop the current capture and return what was recorded, if anything
    async fn stop(&self) -> Result<Option<RecordingRecord>>;

    /// Whether the engine is capturing right now
    async fn is_recording(&self) -> Result<bool>;

    /// Metadata of the capture in progress
    async fn active_recording(&self) -> Result<Option<RecordingRecord>>;

    /// Transport name for logging
    fn name(&self) -> &str;
}

/// Engine reached through NATS request/reply on `<prefix>.{start,stop,status,active}`
pub struct NatsEngineTransport {
    nats: NatsClient,
}

impl NatsEngineTransport {
    pub fn new(nats: NatsClient) -> Self {
        Self { nats }
    }
}

#[async_trait::async_trait]
impl EngineTransport for NatsEngineTransport {
    async fn start(&self, phone_number: &str, call_start_time_ms: i64) -> Result<bool> {
        let request = StartRequest {
            phone_number: phone_number.to_string(),
            call_start_time_ms,
        };
        let reply: StartReply = self.nats.request("start", &request).await?;
        Ok(reply.success)
    }

    async fn stop(&self) -> Result<Option<RecordingRecord>> {
        let reply: RecordingReply = self.nats.request("stop", &EmptyRequest::default()).await?;
        Ok(reply.recording)
    }

    async fn is_recording(&self) -> Result<bool> {
        let reply: StatusReply = self.nats.request("status", &EmptyRequest::default()).await?;
        Ok(reply.recording)
    }

    async fn active_recording(&self) -> Result<Option<RecordingRecord>> {
        let reply: RecordingReply = self.nats.request("active", &EmptyRequest::default()).await?;
        Ok(reply.recording)
    }

    fn name(&self) -> &str {
        "nats"
    }
}
