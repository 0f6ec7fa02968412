//! Connection to the out-of-process recording engine

mod binder;
mod client;
mod transport;

pub use binder::{EngineBinder, EngineLink, NatsEngineBinder};
pub use client::EngineClient;
pub use transport::{EngineTransport, NatsEngineTransport};
