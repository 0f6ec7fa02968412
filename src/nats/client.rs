use anyhow::{Context, Result};
use async_nats::{Client, ConnectOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

pub struct NatsClient {
    client: Client,
    subject_prefix: String,
}

impl NatsClient {
    /// Connect to NATS server with default options
    pub async fn connect(url: &str, subject_prefix: impl Into<String>) -> Result<Self> {
        Self::connect_with_options(url, subject_prefix, ConnectOptions::new()).await
    }

    /// Connect to NATS server with caller-supplied options (timeouts, event callbacks)
    pub async fn connect_with_options(
        url: &str,
        subject_prefix: impl Into<String>,
        options: ConnectOptions,
    ) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = options
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject_prefix: subject_prefix.into(),
        })
    }

    /// Send a JSON request to `<prefix>.<operation>` and decode the JSON reply
    pub async fn request<Req, Rep>(&self, operation: &str, body: &Req) -> Result<Rep>
    where
        Req: Serialize,
        Rep: DeserializeOwned,
    {
        let subject = format!("{}.{}", self.subject_prefix, operation);
        let payload = serde_json::to_vec(body)?;

        let reply = self
            .client
            .request(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Request to {} failed", subject))?;

        debug!("Reply from {} ({} bytes)", subject, reply.payload.len());

        serde_json::from_slice(&reply.payload)
            .with_context(|| format!("Malformed reply from {}", subject))
    }

    /// Subscribe to call-state events published by the telephony side
    pub async fn subscribe_call_events(&self, subject: &str) -> Result<async_nats::Subscriber> {
        info!("Subscribing to call events on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .context("Failed to subscribe to call events")?;

        info!("Subscribed to {}", subject);

        Ok(subscriber)
    }

    /// Close NATS connection
    pub async fn close(self) -> Result<()> {
        info!("Closing NATS connection");
        self.client.flush().await.context("Failed to flush NATS")?;
        Ok(())
    }
}
