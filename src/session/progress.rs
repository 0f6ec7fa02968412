use super::events::RecorderEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Observer of recording progress, typically the in-call UI
pub trait RecordingProgressListener: Send + Sync {
    fn on_start_recording(&self);

    fn on_stop_recording(&self);

    fn on_recording_time_progress(&self, elapsed_ms: u64);

    /// The engine refused or failed to start; show a transient notice
    fn on_start_failed(&self) {}
}

/// Periodic elapsed-time broadcast while a session is active.
///
/// The timer task does not call listeners itself: it posts
/// `RecorderEvent::ProgressTick` stamped with the current generation into the
/// recorder loop, and ticks from an older generation are discarded there.
pub struct ProgressNotifier {
    interval: Duration,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    events: mpsc::UnboundedSender<RecorderEvent>,
    listeners: Vec<Arc<dyn RecordingProgressListener>>,
}

impl ProgressNotifier {
    pub fn new(interval: Duration, events: mpsc::UnboundedSender<RecorderEvent>) -> Self {
        Self {
            // tokio::time::interval panics on a zero period
            interval: interval.max(Duration::from_millis(1)),
            generation: 0,
            timer: None,
            events,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: Arc<dyn RecordingProgressListener>) {
        self.listeners.push(listener);
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Begin ticking; the first tick is posted immediately
    pub fn start(&mut self) {
        self.cancel();

        let generation = self.generation;
        let events = self.events.clone();
        let period = self.interval;

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if events.send(RecorderEvent::ProgressTick { generation }).is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop ticking. Ticks already queued become stale.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
    }

    /// Forward a tick to listeners if it belongs to the running timer
    pub fn deliver(&self, generation: u64, elapsed_ms: u64) -> bool {
        if !self.is_running() || generation != self.generation {
            debug!("Dropping stale progress tick (generation {})", generation);
            return false;
        }

        for listener in &self.listeners {
            listener.on_recording_time_progress(elapsed_ms);
        }
        true
    }

    pub fn notify_start(&self) {
        for listener in &self.listeners {
            listener.on_start_recording();
        }
    }

    pub fn notify_stop(&self) {
        for listener in &self.listeners {
            listener.on_stop_recording();
        }
    }

    pub fn notify_start_failed(&self) {
        for listener in &self.listeners {
            listener.on_start_failed();
        }
    }
}

impl Drop for ProgressNotifier {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
