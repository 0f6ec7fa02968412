use thiserror::Error;

/// Failure classes of the recording subsystem.
///
/// None of these ever reach call handling: each public operation maps them to
/// its degraded value (`false`, `None`, an empty list) after logging.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("recording engine is not connected")]
    EngineUnavailable,

    #[error("recording engine rejected {0}")]
    EngineRejected(&'static str),

    #[error("recording engine RPC failed: {0:#}")]
    EngineRpc(#[from] anyhow::Error),

    #[error("failed to save recording: {0}")]
    StoreWrite(#[source] rusqlite::Error),

    #[error("failed to read recordings: {0}")]
    StoreRead(#[source] rusqlite::Error),
}

pub type RecorderResult<T> = std::result::Result<T, RecorderError>;
