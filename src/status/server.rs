use super::handlers::{health_handler, liveness_handler};
use crate::app::LifecycleState;
use crate::error::StatusError;
use crate::messaging::MessagingAdapter;
use crate::storage::StorageHandle;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared state for the Axum server
#[derive(Clone)]
pub struct ServerState {
    pub(crate) storage: StorageHandle,
    pub(crate) messaging: MessagingAdapter,
    pub(crate) lifecycle: watch::Receiver<LifecycleState>,
    pub(crate) version: String,
}

impl ServerState {
    pub fn new(
        storage: StorageHandle,
        messaging: MessagingAdapter,
        lifecycle: watch::Receiver<LifecycleState>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            messaging,
            lifecycle,
            version: version.into(),
        }
    }
}

/// HTTP status surface exposing liveness and health endpoints.
///
/// Construction requires a `StorageHandle`, so it can only be bound after
/// storage has resolved to a live connection.
pub struct StatusServer {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), StatusError>>,
}

impl StatusServer {
    pub fn router(state: ServerState) -> Router {
        Router::new()
            .route("/", get(liveness_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the listener and start serving in a background task
    pub async fn bind(address: &str, state: ServerState) -> Result<Self, StatusError> {
        let listener = tokio::net::TcpListener::bind(address)
            .await
            .map_err(|e| StatusError::BindFailed {
                address: address.to_string(),
                source: e,
            })?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| StatusError::BindFailed {
                address: address.to_string(),
                source: e,
            })?;

        info!("Server is listening on http://{}", local_addr);

        let shutdown = CancellationToken::new();
        let app = Self::router(state);
        let signal = shutdown.clone().cancelled_owned();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(signal)
                .await
                .map_err(|e| StatusError::Serve {
                    details: e.to_string(),
                })
        });

        Ok(Self {
            local_addr,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting new connections; in-flight requests keep running
    pub fn stop_accepting(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Status server no longer accepting connections");
            self.shutdown.cancel();
        }
    }

    /// Wait up to `limit` for in-flight requests to finish.
    ///
    /// Returns `true` when the server wound down inside the limit.
    pub async fn drain(self, limit: Duration) -> bool {
        self.stop_accepting();

        let mut task = self.task;
        match timeout(limit, &mut task).await {
            Ok(Ok(Ok(()))) => {
                info!("Status server stopped");
                true
            }
            Ok(Ok(Err(e))) => {
                error!("Status server exited with error: {}", e);
                true
            }
            Ok(Err(e)) => {
                error!("Status server task failed: {}", e);
                true
            }
            Err(_) => {
                warn!(
                    "Status server still draining after {:?}, abandoning in-flight requests",
                    limit
                );
                task.abort();
                false
            }
        }
    }
}
