use super::config::{EnabledFlag, SessionConfig};
use super::events::{Command, RecorderEvent};
use super::manager::CallRecorder;
use super::progress::RecordingProgressListener;
use crate::call::{CallIdentity, CallSnapshot};
use crate::engine::EngineBinder;
use crate::recording::{RecordingIndex, RecordingRecord};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

/// Owns a [`CallRecorder`] and feeds it events one at a time
pub struct RecorderLoop {
    recorder: CallRecorder,
    events: mpsc::UnboundedReceiver<RecorderEvent>,
}

impl RecorderLoop {
    pub fn new(
        binder: Arc<dyn EngineBinder>,
        index: Arc<dyn RecordingIndex>,
        enabled: EnabledFlag,
        config: SessionConfig,
    ) -> (Self, RecorderHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let recorder = CallRecorder::new(binder, index, enabled, config, tx.clone());

        (
            Self {
                recorder,
                events: rx,
            },
            RecorderHandle { events: tx },
        )
    }

    /// Process events until shutdown is requested
    pub async fn run(mut self) {
        info!("Recorder loop started");

        while let Some(event) = self.events.recv().await {
            if !self.recorder.handle_event(event).await {
                break;
            }
        }

        self.recorder.shutdown().await;
        info!("Recorder loop stopped");
    }
}

/// Cloneable entry point for the call source and the UI layer.
///
/// Every method degrades to `false`/`None` once the loop has stopped.
#[derive(Clone)]
pub struct RecorderHandle {
    events: mpsc::UnboundedSender<RecorderEvent>,
}

impl RecorderHandle {
    pub fn call_list_changed(&self, calls: Vec<CallSnapshot>) {
        let _ = self.events.send(RecorderEvent::CallListChanged(calls));
    }

    pub fn call_disconnected(&self, call: CallSnapshot) {
        let _ = self.events.send(RecorderEvent::CallDisconnected(call));
    }

    pub fn add_listener(&self, listener: Arc<dyn RecordingProgressListener>) {
        let _ = self.events.send(RecorderEvent::Command(Command::AddListener(listener)));
    }

    pub async fn start_recording(&self, identity: CallIdentity) -> bool {
        self.ask(|reply| Command::StartRecording { identity, reply })
            .await
            .unwrap_or(false)
    }

    pub async fn finish_recording(&self) {
        let _ = self.ask(|reply| Command::FinishRecording { reply }).await;
    }

    pub async fn is_recording(&self) -> bool {
        self.ask(|reply| Command::IsRecording { reply })
            .await
            .unwrap_or(false)
    }

    pub async fn active_session(&self) -> Option<RecordingRecord> {
        self.ask(|reply| Command::ActiveSession { reply })
            .await
            .flatten()
    }

    /// Ask the loop to finish any recording, unbind, and exit
    pub fn shutdown(&self) {
        let _ = self.events.send(RecorderEvent::Command(Command::Shutdown));
    }

    async fn ask<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        self.events
            .send(RecorderEvent::Command(command(tx)))
            .ok()?;
        rx.await.ok()
    }
}
