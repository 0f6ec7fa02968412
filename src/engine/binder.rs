use super::transport::{EngineTransport, NatsEngineTransport};
use crate::nats::NatsClient;
use crate::session::RecorderEvent;
use async_nats::{ConnectOptions, Event};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Platform primitive that establishes the connection to the recording engine.
///
/// Binding is asynchronous: `bind` only starts the attempt, and the transport
/// is delivered later through the [`EngineLink`].
pub trait EngineBinder: Send + Sync {
    /// Begin connecting; report the outcome through `link`
    fn bind(&self, link: EngineLink);

    /// Drop the connection, if any
    fn unbind(&self);
}

/// Callback side of a single bind attempt.
///
/// Connection events are tagged with the attempt's epoch so that a slow
/// callback from an earlier binding cannot revive a newer state.
#[derive(Clone)]
pub struct EngineLink {
    epoch: u64,
    events: mpsc::UnboundedSender<RecorderEvent>,
}

impl EngineLink {
    pub(crate) fn new(epoch: u64, events: mpsc::UnboundedSender<RecorderEvent>) -> Self {
        Self { epoch, events }
    }

    /// Connection established; the transport is ready for requests
    pub fn connected(&self, transport: Arc<dyn EngineTransport>) {
        let _ = self.events.send(RecorderEvent::EngineConnected {
            epoch: self.epoch,
            transport,
        });
    }

    /// Connection went away
    pub fn lost(&self) {
        let _ = self.events.send(RecorderEvent::EngineLost { epoch: self.epoch });
    }
}

/// Binds to an engine listening on NATS
pub struct NatsEngineBinder {
    url: String,
    subject_prefix: String,
    request_timeout: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NatsEngineBinder {
    pub fn new(url: impl Into<String>, subject_prefix: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            subject_prefix: subject_prefix.into(),
            request_timeout,
            task: Mutex::new(None),
        }
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        match self.task.lock() {
            Ok(mut task) => task.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl EngineBinder for NatsEngineBinder {
    fn bind(&self, link: EngineLink) {
        if let Some(previous) = self.take_task() {
            previous.abort();
        }

        let url = self.url.clone();
        let subject_prefix = self.subject_prefix.clone();
        let request_timeout = self.request_timeout;

        let handle = tokio::spawn(async move {
            // The callback only holds a weak reference; this task and the
            // recorder own the transport.
            let slot: Arc<OnceLock<Weak<NatsEngineTransport>>> = Arc::new(OnceLock::new());

            let callback_link = link.clone();
            let callback_slot = Arc::clone(&slot);
            let options = ConnectOptions::new()
                .request_timeout(Some(request_timeout))
                .event_callback(move |event| {
                    let link = callback_link.clone();
                    let slot = Arc::clone(&callback_slot);
                    async move {
                        match event {
                            Event::Disconnected => {
                                warn!("Recording engine connection lost");
                                link.lost();
                            }
                            Event::Connected => {
                                if let Some(transport) = slot.get().and_then(Weak::upgrade) {
                                    info!("Recording engine connection re-established");
                                    link.connected(transport);
                                }
                            }
                            other => {
                                warn!("Recording engine connection event: {:?}", other);
                            }
                        }
                    }
                });

            let nats = match NatsClient::connect_with_options(&url, subject_prefix, options).await {
                Ok(nats) => nats,
                Err(e) => {
                    warn!("Failed to bind recording engine at {}: {:#}", url, e);
                    return;
                }
            };

            let transport = Arc::new(NatsEngineTransport::new(nats));
            let _ = slot.set(Arc::downgrade(&transport));
            link.connected(transport.clone());

            // Keep the connection alive until unbind aborts this task
            std::future::pending::<()>().await;
            drop(transport);
        });

        match self.task.lock() {
            Ok(mut task) => *task = Some(handle),
            Err(poisoned) => *poisoned.into_inner() = Some(handle),
        }
    }

    fn unbind(&self) {
        if let Some(task) = self.take_task() {
            info!("Unbinding recording engine");
            task.abort();
        }
    }
}
