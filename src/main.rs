use anyhow::{Context, Result};
use callrec::{
    CallEventMessage, Config, EnabledFlag, NatsClient, NatsEngineBinder, RecorderHandle,
    RecorderLoop, RecordingIndex, RecordingProgressListener, RecordingStore,
};
use clap::{Parser, Subcommand};
use futures::stream::StreamExt;
use std::sync::Arc;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "callrec", about = "Call recording session manager")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/callrec")]
    config: String,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the call-event feed and record calls through the engine
    Listen,
    /// List the recordings indexed for a call
    Recordings {
        /// Phone number of the call
        number: String,
        /// Call creation time (ms since epoch)
        call_time_ms: i64,
    },
}

/// Logs recording progress in place of an in-call UI
struct LogProgress;

impl RecordingProgressListener for LogProgress {
    fn on_start_recording(&self) {
        info!("● recording");
    }

    fn on_stop_recording(&self) {
        info!("■ recording stopped");
    }

    fn on_recording_time_progress(&self, elapsed_ms: u64) {
        tracing::debug!("recording {}", callrec::control::format_elapsed(elapsed_ms));
    }

    fn on_start_failed(&self) {
        warn!("Call recording failed to start");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Commands::Listen => listen(cfg).await,
        Commands::Recordings {
            number,
            call_time_ms,
        } => list_recordings(cfg, &number, call_time_ms),
    }
}

fn list_recordings(cfg: Config, number: &str, call_time_ms: i64) -> Result<()> {
    let store = RecordingStore::open(cfg.db_path(), cfg.recordings_dir())?;
    let recordings = store.query(number, call_time_ms);

    if recordings.is_empty() {
        println!("No recordings for {} at {}", number, call_time_ms);
    }
    for recording in recordings {
        println!(
            "{}\t{}",
            recording.recording_created_at_ms,
            recording.file_path(store.recordings_dir()).display()
        );
    }

    Ok(())
}

async fn listen(cfg: Config) -> Result<()> {
    info!("callrec v{}", env!("CARGO_PKG_VERSION"));
    info!("Recording enabled: {}", cfg.recording.enabled);
    info!("Recordings directory: {}", cfg.recordings_dir().display());
    info!("Engine: {} ({}.*)", cfg.engine.nats_url, cfg.engine.subject_prefix);

    let store = RecordingStore::open(cfg.db_path(), cfg.recordings_dir())?;
    let binder = NatsEngineBinder::new(
        cfg.engine.nats_url.clone(),
        cfg.engine.subject_prefix.clone(),
        cfg.request_timeout(),
    );

    let (recorder_loop, handle) = RecorderLoop::new(
        Arc::new(binder),
        Arc::new(store),
        EnabledFlag::new(cfg.recording.enabled),
        cfg.session_config(),
    );
    handle.add_listener(Arc::new(LogProgress));

    let recorder_task = tokio::spawn(recorder_loop.run());

    let feed = NatsClient::connect(&cfg.engine.nats_url, cfg.engine.subject_prefix.clone())
        .await
        .context("Failed to connect call-event feed")?;
    let mut events = feed.subscribe_call_events(&cfg.calls.subject).await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            msg = events.next() => {
                let Some(msg) = msg else {
                    warn!("Call-event subscription closed");
                    break;
                };
                forward_call_event(&handle, &msg.payload);
            }
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    handle.shutdown();
    recorder_task.await.context("Recorder loop panicked")?;
    feed.close().await?;

    Ok(())
}

fn forward_call_event(handle: &RecorderHandle, payload: &[u8]) {
    match serde_json::from_slice::<CallEventMessage>(payload) {
        Ok(CallEventMessage::CallListChanged { calls }) => handle.call_list_changed(calls),
        Ok(CallEventMessage::CallDisconnected { call }) => handle.call_disconnected(call),
        Err(e) => warn!("Failed to parse call event: {}", e),
    }
}
