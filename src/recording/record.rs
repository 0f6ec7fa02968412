use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A completed call recording as reported by the engine and indexed by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingRecord {
    /// Number of the recorded call
    pub phone_number: String,

    /// When the call was created (ms since epoch)
    pub call_creation_time_ms: i64,

    /// Audio file name, relative to the recordings directory
    pub file_name: String,

    /// When the engine started writing this recording (ms since epoch)
    pub recording_created_at_ms: i64,
}

impl RecordingRecord {
    /// Location of the backing audio file under `recordings_dir`
    pub fn file_path(&self, recordings_dir: &Path) -> PathBuf {
        recordings_dir.join(&self.file_name)
    }

    pub fn file_exists(&self, recordings_dir: &Path) -> bool {
        self.file_path(recordings_dir).is_file()
    }
}

impl fmt::Display for RecordingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} @ {})",
            self.file_name, self.phone_number, self.call_creation_time_ms
        )
    }
}
