//! NATS client wrapper
//!
//! Connection management with keep-alive and a thin publish surface.

use async_nats::{Client, ConnectOptions};
use bytes::Bytes;
use std::time::Duration;
use tracing::info;

use crate::config::NatsArgs;
use crate::types::TrackerError;

/// Default ping interval for keep-alive
const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(120);

/// NATS client wrapper
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
    name: String,
}

impl NatsClient {
    /// Create a new NATS client
    pub async fn new(args: &NatsArgs, name: &str) -> Result<Self, TrackerError> {
        info!("Connecting to NATS at {}", args.nats_url);

        // Fail fast if NATS isn't available; reconnection still works
        // after the initial successful connection
        let mut options = ConnectOptions::new()
            .name(name)
            .ping_interval(DEFAULT_PING_INTERVAL)
            .connection_timeout(Duration::from_secs(5));

        if let (Some(user), Some(pass)) = (&args.nats_user, &args.nats_password) {
            options = options.user_and_password(user.clone(), pass.clone());
        }

        let client = options
            .connect(&args.nats_url)
            .await
            .map_err(|e| TrackerError::Notify(format!("Failed to connect: {}", e)))?;

        info!("Connected to NATS at {}", args.nats_url);

        Ok(Self {
            client,
            name: name.to_string(),
        })
    }

    /// Publish a message to a subject
    pub async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), TrackerError> {
        self.client
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| TrackerError::Notify(format!("Publish failed: {}", e)))
    }

    /// Flush pending messages
    pub async fn flush(&self) -> Result<(), TrackerError> {
        self.client
            .flush()
            .await
            .map_err(|e| TrackerError::Notify(format!("Flush failed: {}", e)))
    }

    /// Get the client name
    pub fn name(&self) -> &str {
        &self.name
    }
}
