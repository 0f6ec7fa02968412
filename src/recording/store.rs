use super::record::RecordingRecord;
use crate::error::{RecorderError, RecorderResult};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS call_recordings (
  _id INTEGER PRIMARY KEY AUTOINCREMENT,
  phone_number TEXT,
  call_date INTEGER,
  recording_filename TEXT,
  creation_date INTEGER
);

CREATE INDEX IF NOT EXISTS phone_number_call_date_index
  ON call_recordings (phone_number, call_date);
"#;

/// Sink for completed recordings, as seen by the session manager
pub trait RecordingIndex: Send + Sync + 'static {
    /// Append a record. Failures are logged and dropped.
    fn put(&self, record: &RecordingRecord);

    /// Records for one call, oldest first, restricted to files that still exist
    fn query(&self, phone_number: &str, call_creation_time_ms: i64) -> Vec<RecordingRecord>;
}

/// Durable, append-only index of call recordings backed by SQLite.
///
/// Every operation opens its own connection and closes it before returning,
/// so nothing is held open between sessions.
#[derive(Debug, Clone)]
pub struct RecordingStore {
    db_path: PathBuf,
    recordings_dir: PathBuf,
}

impl RecordingStore {
    /// Create the store, making sure the database directory and schema exist
    pub fn open(db_path: impl Into<PathBuf>, recordings_dir: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create store dir {}", parent.display()))?;
            }
        }

        let store = Self {
            db_path,
            recordings_dir: recordings_dir.into(),
        };
        store
            .connect()
            .with_context(|| format!("initialize {}", store.db_path.display()))?;

        info!("Recording store ready at {}", store.db_path.display());
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn recordings_dir(&self) -> &Path {
        &self.recordings_dir
    }

    /// Insert a record, returning its row id
    pub fn try_put(&self, record: &RecordingRecord) -> RecorderResult<i64> {
        let conn = self.connect().map_err(RecorderError::StoreWrite)?;
        conn.execute(
            "INSERT INTO call_recordings (phone_number, call_date, recording_filename, creation_date) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.phone_number,
                record.call_creation_time_ms,
                record.file_name,
                record.recording_created_at_ms,
            ],
        )
        .map_err(RecorderError::StoreWrite)?;

        Ok(conn.last_insert_rowid())
    }

    /// All rows for a call ordered by creation date, without the file check
    pub fn try_query(
        &self,
        phone_number: &str,
        call_creation_time_ms: i64,
    ) -> RecorderResult<Vec<RecordingRecord>> {
        let conn = self.connect().map_err(RecorderError::StoreRead)?;
        let mut stmt = conn
            .prepare(
                "SELECT recording_filename, creation_date FROM call_recordings \
                 WHERE phone_number = ?1 AND call_date = ?2 \
                 ORDER BY creation_date, _id",
            )
            .map_err(RecorderError::StoreRead)?;

        let rows = stmt
            .query_map(params![phone_number, call_creation_time_ms], |row| {
                Ok(RecordingRecord {
                    phone_number: phone_number.to_string(),
                    call_creation_time_ms,
                    file_name: row.get(0)?,
                    recording_created_at_ms: row.get(1)?,
                })
            })
            .map_err(RecorderError::StoreRead)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(RecorderError::StoreRead)
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }
}

impl RecordingIndex for RecordingStore {
    fn put(&self, record: &RecordingRecord) {
        match self.try_put(record) {
            Ok(id) => info!("Saved recording {} with id {}", record, id),
            Err(e) => warn!("Failed to save recording {}: {}", record, e),
        }
    }

    fn query(&self, phone_number: &str, call_creation_time_ms: i64) -> Vec<RecordingRecord> {
        match self.try_query(phone_number, call_creation_time_ms) {
            Ok(records) => records
                .into_iter()
                .filter(|r| r.file_exists(&self.recordings_dir))
                .collect(),
            Err(e) => {
                warn!(
                    "Failed to fetch recordings for number {} date {}: {}",
                    phone_number, call_creation_time_ms, e
                );
                Vec::new()
            }
        }
    }
}
