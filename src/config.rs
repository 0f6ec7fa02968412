use crate::session::SessionConfig;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recording: RecordingConfig,
    pub store: StoreConfig,
    pub engine: EngineConfig,
    pub calls: CallsConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub enabled: bool,
    pub recordings_dir: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            recordings_dir: "~/CallRecordings".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "~/.local/share/callrec/callrecordings.db".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub nats_url: String,
    pub subject_prefix: String,
    pub request_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            subject_prefix: "callrecorder".to_string(),
            request_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CallsConfig {
    pub subject: String,
}

impl Default for CallsConfig {
    fn default() -> Self {
        Self {
            subject: "calls.events".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub interval_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { interval_ms: 500 }
    }
}

impl Config {
    /// Load `path` (any format the `config` crate knows, extension optional)
    /// layered under `CALLREC__SECTION__KEY` environment overrides.
    /// A missing file leaves the defaults in place.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("CALLREC").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn recordings_dir(&self) -> PathBuf {
        expand_path(&self.recording.recordings_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        expand_path(&self.store.db_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.request_timeout_ms)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            progress_interval: Duration::from_millis(self.progress.interval_ms.max(1)),
        }
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load("/nonexistent/callrec").unwrap();
        assert!(!cfg.recording.enabled);
        assert_eq!(cfg.progress.interval_ms, 500);
        assert_eq!(cfg.engine.subject_prefix, "callrecorder");
        assert_eq!(cfg.session_config().progress_interval, Duration::from_millis(500));
    }

    #[test]
    fn file_overrides_selected_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("callrec.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[recording]\nenabled = true\n\n[engine]\nrequest_timeout_ms = 750").unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert!(cfg.recording.enabled);
        assert_eq!(cfg.request_timeout(), Duration::from_millis(750));
        assert_eq!(cfg.engine.nats_url, "nats://localhost:4222");
    }

    #[test]
    fn tilde_is_expanded() {
        let expanded = expand_path("~/recordings");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("recordings"));
    }
}
