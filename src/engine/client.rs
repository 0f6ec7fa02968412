use super::binder::{EngineBinder, EngineLink};
use super::transport::EngineTransport;
use crate::call::CallIdentity;
use crate::error::{RecorderError, RecorderResult};
use crate::recording::RecordingRecord;
use crate::session::RecorderEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Where the recorder stands with respect to the engine
#[derive(Clone)]
pub enum ConnectionState {
    /// No binding requested
    Unbound,
    /// Bind requested, waiting for the connection callback
    Binding,
    /// Transport available
    Connected(Arc<dyn EngineTransport>),
    /// Still bound, but the connection dropped
    Lost,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unbound => "unbound",
            Self::Binding => "binding",
            Self::Connected(_) => "connected",
            Self::Lost => "lost",
        }
    }
}

impl std::fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client side of the recording engine.
///
/// Every operation answers "nothing" while not connected; requests issued
/// between `bind` and the connection callback are not queued.
pub struct EngineClient {
    binder: Arc<dyn EngineBinder>,
    state: ConnectionState,
    epoch: u64,
    events: mpsc::UnboundedSender<RecorderEvent>,
}

impl EngineClient {
    pub fn new(binder: Arc<dyn EngineBinder>, events: mpsc::UnboundedSender<RecorderEvent>) -> Self {
        Self {
            binder,
            state: ConnectionState::Unbound,
            epoch: 0,
            events,
        }
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self.state, ConnectionState::Unbound)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Start binding. Returns `false` if a binding already exists.
    pub fn bind(&mut self) -> bool {
        if self.is_bound() {
            return false;
        }

        self.epoch += 1;
        self.state = ConnectionState::Binding;
        info!("Binding recording engine (epoch {})", self.epoch);
        self.binder.bind(EngineLink::new(self.epoch, self.events.clone()));
        true
    }

    /// Release the binding. Returns `false` if there was none.
    pub fn unbind(&mut self) -> bool {
        if !self.is_bound() {
            return false;
        }

        // Late callbacks from this binding are ignored from here on
        self.epoch += 1;
        self.state = ConnectionState::Unbound;
        self.binder.unbind();
        true
    }

    /// Apply a connection-established callback
    pub fn on_connected(&mut self, epoch: u64, transport: Arc<dyn EngineTransport>) -> bool {
        if epoch != self.epoch || !self.is_bound() {
            debug!("Ignoring stale engine connection (epoch {} != {})", epoch, self.epoch);
            return false;
        }

        info!("Recording engine connected via {}", transport.name());
        self.state = ConnectionState::Connected(transport);
        true
    }

    /// Apply a connection-lost callback. Returns `true` if a live connection was dropped.
    pub fn on_lost(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch || !self.is_connected() {
            return false;
        }

        warn!("Recording engine disconnected");
        self.state = ConnectionState::Lost;
        true
    }

    fn transport(&self) -> RecorderResult<&Arc<dyn EngineTransport>> {
        match &self.state {
            ConnectionState::Connected(transport) => Ok(transport),
            _ => Err(RecorderError::EngineUnavailable),
        }
    }

    pub async fn start(&self, identity: &CallIdentity) -> RecorderResult<()> {
        let transport = self.transport()?;
        if transport
            .start(&identity.phone_number, identity.call_creation_time_ms)
            .await?
        {
            Ok(())
        } else {
            Err(RecorderError::EngineRejected("start"))
        }
    }

    pub async fn stop(&self) -> RecorderResult<Option<RecordingRecord>> {
        let transport = self.transport()?;
        Ok(transport.stop().await?)
    }

    pub async fn is_recording(&self) -> bool {
        let Ok(transport) = self.transport() else {
            return false;
        };

        match transport.is_recording().await {
            Ok(recording) => recording,
            Err(e) => {
                warn!("Exception checking recording status: {:#}", e);
                false
            }
        }
    }

    pub async fn active_recording(&self) -> Option<RecordingRecord> {
        let transport = self.transport().ok()?;

        match transport.active_recording().await {
            Ok(recording) => recording,
            Err(e) => {
                warn!("Exception getting active recording: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingBinder {
        binds: AtomicUsize,
        unbinds: AtomicUsize,
    }

    impl EngineBinder for CountingBinder {
        fn bind(&self, _link: EngineLink) {
            self.binds.fetch_add(1, Ordering::SeqCst);
        }

        fn unbind(&self) {
            self.unbinds.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct NullEngine;

    #[async_trait::async_trait]
    impl EngineTransport for NullEngine {
        async fn start(&self, _: &str, _: i64) -> anyhow::Result<bool> {
            Ok(true)
        }
        async fn stop(&self) -> anyhow::Result<Option<RecordingRecord>> {
            Ok(None)
        }
        async fn is_recording(&self) -> anyhow::Result<bool> {
            Ok(true)
        }
        async fn active_recording(&self) -> anyhow::Result<Option<RecordingRecord>> {
            Ok(None)
        }
        fn name(&self) -> &str {
            "null"
        }
    }

    fn client() -> (EngineClient, Arc<CountingBinder>) {
        let binder = Arc::new(CountingBinder::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        (EngineClient::new(binder.clone(), tx), binder)
    }

    #[test]
    fn bind_and_unbind_are_idempotent() {
        let (mut engine, binder) = client();

        assert!(engine.bind());
        assert!(!engine.bind());
        assert_eq!(binder.binds.load(Ordering::SeqCst), 1);

        assert!(engine.unbind());
        assert!(!engine.unbind());
        assert_eq!(binder.unbinds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn binding_without_callback_is_disconnected() {
        let (mut engine, _) = client();
        engine.bind();

        assert!(!engine.is_connected());
        assert!(!engine.is_recording().await);
        assert!(matches!(
            engine.start(&CallIdentity::new("555", 1)).await,
            Err(RecorderError::EngineUnavailable)
        ));
    }

    #[tokio::test]
    async fn stale_connection_callback_is_ignored() {
        let (mut engine, _) = client();
        engine.bind();
        let stale_epoch = 1;
        engine.unbind();
        engine.bind();

        assert!(!engine.on_connected(stale_epoch, Arc::new(NullEngine)));
        assert!(!engine.is_connected());

        assert!(engine.on_connected(3, Arc::new(NullEngine)));
        assert!(engine.is_recording().await);
    }

    #[test]
    fn lost_connection_stays_bound() {
        let (mut engine, _) = client();
        engine.bind();
        engine.on_connected(1, Arc::new(NullEngine));

        assert!(engine.on_lost(1));
        assert!(engine.is_bound());
        assert!(!engine.is_connected());
        assert!(!engine.on_lost(1));
    }
}
