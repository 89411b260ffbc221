use super::MessagingClient;
use crate::error::MessagingError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Resolution of a messaging connect. Never an error for the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagingStatus {
    Connected,
    Unavailable(String),
}

impl MessagingStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, MessagingStatus::Connected)
    }
}

/// Resolution of a bounded messaging disconnect
#[derive(Debug, Clone, PartialEq)]
pub enum DisconnectOutcome {
    Ack,
    Timeout,
    Failed(String),
    /// There was no client to disconnect
    Skipped,
}

/// Best-effort wrapper around an optional messaging client.
///
/// Every failure is captured and turned into a status value so a broken or
/// absent client can only degrade the host, never stop it.
#[derive(Clone)]
pub struct MessagingAdapter {
    client: Option<Arc<dyn MessagingClient>>,
    connect_timeout: Duration,
    disconnect_timeout: Duration,
}

impl MessagingAdapter {
    pub fn new(
        client: Option<Arc<dyn MessagingClient>>,
        connect_timeout: Duration,
        disconnect_timeout: Duration,
    ) -> Self {
        Self {
            client,
            connect_timeout,
            disconnect_timeout,
        }
    }

    /// Adapter with no client behind it; always unavailable
    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(1), Duration::from_secs(1))
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub async fn connect(&self) -> MessagingStatus {
        let Some(client) = &self.client else {
            let reason = MessagingError::NotConfigured.to_string();
            warn!("Messaging unavailable: {}", reason);
            return MessagingStatus::Unavailable(reason);
        };

        info!("Connecting messaging client");

        match timeout(self.connect_timeout, client.connect()).await {
            Ok(Ok(())) => {
                info!("Messaging client connected");
                MessagingStatus::Connected
            }
            Ok(Err(e)) => {
                error!("Error connecting messaging client: {}", e);
                MessagingStatus::Unavailable(e.to_string())
            }
            Err(_) => {
                let e = MessagingError::Timeout {
                    operation: "connect",
                    timeout: self.connect_timeout,
                };
                error!("Error connecting messaging client: {}", e);
                MessagingStatus::Unavailable(e.to_string())
            }
        }
    }

    /// Live connection state, read from the client on every call
    pub fn is_connected(&self) -> bool {
        self.client
            .as_ref()
            .is_some_and(|client| client.is_connected())
    }

    pub async fn disconnect(&self) -> DisconnectOutcome {
        let Some(client) = &self.client else {
            return DisconnectOutcome::Skipped;
        };

        match timeout(self.disconnect_timeout, client.disconnect()).await {
            Ok(Ok(())) => {
                info!("Messaging client disconnected");
                DisconnectOutcome::Ack
            }
            Ok(Err(e)) => {
                error!("Error disconnecting messaging client: {}", e);
                DisconnectOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(
                    "Messaging disconnect did not finish within {:?}, continuing shutdown",
                    self.disconnect_timeout
                );
                DisconnectOutcome::Timeout
            }
        }
    }
}
