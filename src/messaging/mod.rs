mod adapter;
#[cfg(feature = "websocket")]
mod websocket;


pub use adapter::{DisconnectOutcome, MessagingAdapter, MessagingStatus};
#[cfg(feature = "websocket")]
pub use websocket::WebSocketClient;

use crate::config::MessagingConfig;
use crate::error::MessagingError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// External messaging client driven by the host
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn connect(&self) -> Result<(), MessagingError>;

    fn is_connected(&self) -> bool;

    async fn disconnect(&self) -> Result<(), MessagingError>;
}

/// Build the client named by configuration, if any
pub fn client_from_config(config: &MessagingConfig) -> Option<Arc<dyn MessagingClient>> {
    let url = config.url.as_deref()?;

    #[cfg(feature = "websocket")]
    {
        Some(Arc::new(WebSocketClient::new(url)))
    }

    #[cfg(not(feature = "websocket"))]
    {
        warn!(
            "Messaging url {} configured but websocket support is not compiled in",
            url
        );
        None
    }
}

/// Adapter wired from configuration
pub fn adapter_from_config(config: &MessagingConfig) -> MessagingAdapter {
    let client = client_from_config(config);
    if client.is_none() {
        warn!("No messaging client configured, host will run degraded");
    }
    MessagingAdapter::new(
        client,
        config.connect_timeout(),
        config.disconnect_timeout(),
    )
}
