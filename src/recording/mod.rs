//! Completed call recordings and their durable index

mod record;
mod store;

pub use record::RecordingRecord;
pub use store::{RecordingIndex, RecordingStore};
