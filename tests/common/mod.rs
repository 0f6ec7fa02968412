// Shared fakes for the recorder integration tests
#![allow(dead_code)]

use anyhow::{bail, Result};
use callrec::{
    CallRecorder, EnabledFlag, EngineBinder, EngineLink, EngineTransport, RecorderEvent,
    RecordingIndex, RecordingProgressListener, RecordingRecord, SessionConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// In-process engine that records one call at a time
#[derive(Default)]
pub struct FakeEngine {
    pub current: Mutex<Option<RecordingRecord>>,
    pub reject_start: Mutex<bool>,
    pub fail_rpc: Mutex<bool>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl FakeEngine {
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    fn check_rpc(&self) -> Result<()> {
        if *self.fail_rpc.lock().unwrap() {
            bail!("engine process died");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl EngineTransport for FakeEngine {
    async fn start(&self, phone_number: &str, call_start_time_ms: i64) -> Result<bool> {
        self.check_rpc()?;
        self.starts.fetch_add(1, Ordering::SeqCst);

        let mut current = self.current.lock().unwrap();
        if *self.reject_start.lock().unwrap() || current.is_some() {
            return Ok(false);
        }

        *current = Some(RecordingRecord {
            phone_number: phone_number.to_string(),
            call_creation_time_ms: call_start_time_ms,
            file_name: format!("{}-{}.amr", phone_number, call_start_time_ms),
            recording_created_at_ms: call_start_time_ms + 50,
        });
        Ok(true)
    }

    async fn stop(&self) -> Result<Option<RecordingRecord>> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.check_rpc()?;
        Ok(self.current.lock().unwrap().take())
    }

    async fn is_recording(&self) -> Result<bool> {
        self.check_rpc()?;
        Ok(self.current.lock().unwrap().is_some())
    }

    async fn active_recording(&self) -> Result<Option<RecordingRecord>> {
        self.check_rpc()?;
        Ok(self.current.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Binder that connects synchronously (or never, when `auto_connect` is off)
pub struct FakeBinder {
    pub engine: Arc<FakeEngine>,
    pub auto_connect: bool,
    pub binds: AtomicUsize,
    pub unbinds: AtomicUsize,
    pub last_link: Mutex<Option<EngineLink>>,
}

impl FakeBinder {
    pub fn new(engine: Arc<FakeEngine>) -> Self {
        Self {
            engine,
            auto_connect: true,
            binds: AtomicUsize::new(0),
            unbinds: AtomicUsize::new(0),
            last_link: Mutex::new(None),
        }
    }

    pub fn manual(engine: Arc<FakeEngine>) -> Self {
        Self {
            auto_connect: false,
            ..Self::new(engine)
        }
    }

    pub fn binds(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    pub fn unbinds(&self) -> usize {
        self.unbinds.load(Ordering::SeqCst)
    }

    /// Simulate the engine process going away
    pub fn drop_connection(&self) {
        if let Some(link) = self.last_link.lock().unwrap().as_ref() {
            link.lost();
        }
    }

    /// Deliver the connection callback for the last bind
    pub fn connect(&self) {
        if let Some(link) = self.last_link.lock().unwrap().as_ref() {
            link.connected(self.engine.clone());
        }
    }
}

impl EngineBinder for FakeBinder {
    fn bind(&self, link: EngineLink) {
        self.binds.fetch_add(1, Ordering::SeqCst);
        if self.auto_connect {
            link.connected(self.engine.clone());
        }
        *self.last_link.lock().unwrap() = Some(link);
    }

    fn unbind(&self) {
        self.unbinds.fetch_add(1, Ordering::SeqCst);
    }
}

/// Index that keeps records in memory
#[derive(Default)]
pub struct MemoryIndex {
    pub records: Mutex<Vec<RecordingRecord>>,
}

impl MemoryIndex {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Writes happen on a blocking worker; wait until `n` records landed
    pub async fn wait_for(&self, n: usize) {
        for _ in 0..200 {
            if self.len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {} records, have {}", n, self.len());
    }
}

impl RecordingIndex for MemoryIndex {
    fn put(&self, record: &RecordingRecord) {
        self.records.lock().unwrap().push(record.clone());
    }

    fn query(&self, phone_number: &str, call_creation_time_ms: i64) -> Vec<RecordingRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.phone_number == phone_number && r.call_creation_time_ms == call_creation_time_ms)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Start,
    Stop,
    Progress(u64),
    StartFailed,
}

/// Listener that records every callback
#[derive(Default)]
pub struct RecordingListener {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingListener {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn count(&self, notice: &Notice) -> usize {
        self.notices().iter().filter(|n| *n == notice).count()
    }

    pub fn progress_count(&self) -> usize {
        self.notices()
            .iter()
            .filter(|n| matches!(n, Notice::Progress(_)))
            .count()
    }
}

impl RecordingProgressListener for RecordingListener {
    fn on_start_recording(&self) {
        self.notices.lock().unwrap().push(Notice::Start);
    }

    fn on_stop_recording(&self) {
        self.notices.lock().unwrap().push(Notice::Stop);
    }

    fn on_recording_time_progress(&self, elapsed_ms: u64) {
        self.notices.lock().unwrap().push(Notice::Progress(elapsed_ms));
    }

    fn on_start_failed(&self) {
        self.notices.lock().unwrap().push(Notice::StartFailed);
    }
}

/// A recorder wired to fakes, with its event queue exposed
pub struct Harness {
    pub recorder: CallRecorder,
    pub events: mpsc::UnboundedReceiver<RecorderEvent>,
    pub engine: Arc<FakeEngine>,
    pub binder: Arc<FakeBinder>,
    pub index: Arc<MemoryIndex>,
    pub listener: Arc<RecordingListener>,
    pub enabled: EnabledFlag,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_binder(|engine| FakeBinder::new(engine))
    }

    pub fn with_binder(make: impl FnOnce(Arc<FakeEngine>) -> FakeBinder) -> Self {
        let engine = Arc::new(FakeEngine::default());
        let binder = Arc::new(make(engine.clone()));
        let index = Arc::new(MemoryIndex::default());
        let listener = Arc::new(RecordingListener::default());
        let enabled = EnabledFlag::new(true);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut recorder = CallRecorder::new(
            binder.clone(),
            index.clone(),
            enabled.clone(),
            SessionConfig::default(),
            tx,
        );
        recorder.add_listener(listener.clone());

        Self {
            recorder,
            events: rx,
            engine,
            binder,
            index,
            listener,
            enabled,
        }
    }

    /// Feed queued connection events into the recorder; progress ticks are dropped
    pub async fn pump_connection_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            if matches!(
                event,
                RecorderEvent::EngineConnected { .. } | RecorderEvent::EngineLost { .. }
            ) {
                self.recorder.handle_event(event).await;
            }
        }
    }

    /// Feed every queued event into the recorder
    pub async fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.recorder.handle_event(event).await;
        }
    }
}
