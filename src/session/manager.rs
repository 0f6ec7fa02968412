use super::config::{EnabledFlag, SessionConfig};
use super::events::{Command, RecorderEvent};
use super::progress::{ProgressNotifier, RecordingProgressListener};
use super::state::{RecordingSession, SessionState};
use crate::call::{CallIdentity, CallSnapshot, CallState};
use crate::engine::{EngineBinder, EngineClient, EngineTransport};
use crate::error::RecorderError;
use crate::recording::{RecordingIndex, RecordingRecord};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Drives call recording from call-state events.
///
/// Binds to the recording engine when the first call goes live, stops the
/// recording when its call is held or disconnected, hands finished recordings
/// to the index, and unbinds once no call is left. All state is mutated from
/// the single task that owns this value.
pub struct CallRecorder {
    engine: EngineClient,
    index: Arc<dyn RecordingIndex>,
    enabled: EnabledFlag,
    session: Option<RecordingSession>,
    progress: ProgressNotifier,
    calls: Vec<CallSnapshot>,
}

impl CallRecorder {
    pub fn new(
        binder: Arc<dyn EngineBinder>,
        index: Arc<dyn RecordingIndex>,
        enabled: EnabledFlag,
        config: SessionConfig,
        events: mpsc::UnboundedSender<RecorderEvent>,
    ) -> Self {
        Self {
            engine: EngineClient::new(binder, events.clone()),
            index,
            enabled,
            session: None,
            progress: ProgressNotifier::new(config.progress_interval, events),
            calls: Vec::new(),
        }
    }

    pub fn engine(&self) -> &EngineClient {
        &self.engine
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    /// Calls as of the last call-list event
    pub fn calls(&self) -> &[CallSnapshot] {
        &self.calls
    }

    pub fn is_progress_running(&self) -> bool {
        self.progress.is_running()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn RecordingProgressListener>) {
        self.progress.add_listener(listener);
    }

    /// Connect to the engine if recording is enabled and not already bound
    pub fn bind(&mut self) {
        if !self.enabled.get() {
            debug!("Call recording disabled; not binding engine");
            return;
        }
        self.engine.bind();
    }

    /// Release the engine connection.
    ///
    /// A recording the engine still holds is stopped and indexed first; only a
    /// session whose connection is already gone is dropped without a stop.
    pub async fn unbind(&mut self) {
        if self.session.is_some() && self.engine.is_connected() {
            info!("Unbinding with an active recording; stopping it first");
            self.finish_recording().await;
        }
        if self.engine.unbind() {
            info!("Recording engine unbound");
            self.end_session_without_stop("engine unbound");
        }
    }

    /// Ask the engine to record `identity`. `false` leaves the state untouched.
    pub async fn start_recording(&mut self, identity: CallIdentity) -> bool {
        if let Some(session) = &self.session {
            warn!(
                "Refusing to record {}: session {} already records {}",
                identity, session.id, session.identity
            );
            return false;
        }

        match self.engine.start(&identity).await {
            Ok(()) => {
                let session = RecordingSession::start(identity);
                info!("Recording started: {} (session {})", session.identity, session.id);
                self.session = Some(session);
                self.progress.notify_start();
                self.progress.start();
                true
            }
            Err(e) => {
                match &e {
                    RecorderError::EngineUnavailable => {
                        warn!("Cannot record {}: {}", identity, e)
                    }
                    _ => warn!("Failed to start recording {}: {}", identity, e),
                }
                self.progress.notify_start_failed();
                false
            }
        }
    }

    pub async fn is_recording(&self) -> bool {
        self.engine.is_recording().await
    }

    /// In-flight recording as reported by the engine
    pub async fn active_session(&self) -> Option<RecordingRecord> {
        self.engine.active_recording().await
    }

    /// Stop the engine and index what it recorded.
    ///
    /// Progress is cancelled and listeners are told the session ended whether
    /// or not the engine call succeeds.
    pub async fn finish_recording(&mut self) {
        self.progress.cancel();
        if let Some(session) = self.session.as_mut() {
            session.state = SessionState::Stopping;
        }

        match self.engine.stop().await {
            Ok(Some(record)) => self.persist(record),
            Ok(None) => debug!("Engine had no recording to stop"),
            Err(e) => warn!("Failed to stop recording: {}", e),
        }

        if let Some(session) = self.session.take() {
            info!(
                "Recording finished: {} (session {}, started {}, {} ms)",
                session.identity,
                session.id,
                session.started_at.to_rfc3339(),
                session.elapsed_ms()
            );
        }
        self.progress.notify_stop();
    }

    /// Hand a finished recording to the index on a blocking worker
    fn persist(&self, record: RecordingRecord) {
        info!("Saving recording {}", record);
        let index = Arc::clone(&self.index);
        tokio::task::spawn_blocking(move || index.put(&record));
    }

    /// Drop the session without a stop request: the engine is gone
    fn end_session_without_stop(&mut self, reason: &str) {
        self.progress.cancel();
        if let Some(session) = self.session.take() {
            warn!(
                "Recording of {} ended without stop ({}, session {})",
                session.identity, reason, session.id
            );
            self.progress.notify_stop();
        }
    }

    fn active_identity(&self) -> Option<&CallIdentity> {
        self.session
            .as_ref()
            .filter(|s| s.is_active())
            .map(|s| &s.identity)
    }

    pub async fn on_call_list_changed(&mut self, calls: Vec<CallSnapshot>) {
        self.calls = calls;

        if !self.engine.is_bound() {
            if self.calls.iter().any(|c| c.state.is_live()) {
                self.bind();
            }
            return;
        }

        let Some(identity) = self.active_identity() else {
            return;
        };

        let held = self
            .calls
            .iter()
            .any(|c| c.state == CallState::OnHold && identity.matches_number(&c.number));

        // Resuming the call later does not restart the recording
        if held {
            info!("Call {} placed on hold; stopping recording", identity);
            self.finish_recording().await;
        }
    }

    pub async fn on_call_disconnected(&mut self, call: CallSnapshot) {
        if let Some(known) = self.calls.iter_mut().find(|c| c.is_same_call(&call)) {
            known.state = CallState::Disconnected;
        }

        let matches_active = self
            .active_identity()
            .is_some_and(|identity| identity.matches_number(&call.number));
        if matches_active {
            info!("Call {} disconnected; stopping recording", call.number);
            self.finish_recording().await;
        }

        // An idle entry still counts as a remaining call here
        if self.calls.iter().all(|c| c.state == CallState::Disconnected) {
            self.unbind().await;
        }
    }

    pub fn on_engine_connected(&mut self, epoch: u64, transport: Arc<dyn EngineTransport>) {
        self.engine.on_connected(epoch, transport);
    }

    pub fn on_engine_lost(&mut self, epoch: u64) {
        if self.engine.on_lost(epoch) {
            self.end_session_without_stop("engine disconnected");
        }
    }

    pub fn on_progress_tick(&self, generation: u64) {
        if let Some(session) = self.session.as_ref().filter(|s| s.is_active()) {
            self.progress.deliver(generation, session.elapsed_ms());
        }
    }

    /// Process one event. Returns `false` once a shutdown was requested.
    pub async fn handle_event(&mut self, event: RecorderEvent) -> bool {
        debug!("Recorder event: {}", event.kind());

        match event {
            RecorderEvent::CallListChanged(calls) => self.on_call_list_changed(calls).await,
            RecorderEvent::CallDisconnected(call) => self.on_call_disconnected(call).await,
            RecorderEvent::EngineConnected { epoch, transport } => {
                self.on_engine_connected(epoch, transport)
            }
            RecorderEvent::EngineLost { epoch } => self.on_engine_lost(epoch),
            RecorderEvent::ProgressTick { generation } => self.on_progress_tick(generation),
            RecorderEvent::Command(command) => return self.handle_command(command).await,
        }
        true
    }

    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::StartRecording { identity, reply } => {
                let _ = reply.send(self.start_recording(identity).await);
            }
            Command::FinishRecording { reply } => {
                self.finish_recording().await;
                let _ = reply.send(());
            }
            Command::IsRecording { reply } => {
                let _ = reply.send(self.is_recording().await);
            }
            Command::ActiveSession { reply } => {
                let _ = reply.send(self.active_session().await);
            }
            Command::AddListener(listener) => self.add_listener(listener),
            Command::Shutdown => return false,
        }
        true
    }

    /// Stop any recording and release the engine before the loop exits
    pub async fn shutdown(&mut self) {
        if self.session.is_some() {
            self.finish_recording().await;
        }
        self.unbind().await;
    }
}
