use super::{LifecycleState, Orchestrator};
use crate::error::Result;
use crate::status::{ServerState, StatusServer};
use crate::storage::StorageOutcome;
use tracing::{error, info, warn};

impl Orchestrator {
    /// Bring the host's dependencies up in order.
    ///
    /// Storage must resolve before anything else starts; messaging is best
    /// effort; the status server binds last, followed by signal handlers.
    pub async fn startup(&mut self) -> Result<LifecycleState> {
        info!("Starting bot host v{}", self.version);

        // Storage is the only hard dependency
        let url = self.config.storage.resolved_url();
        let policy = self.config.storage.retry_policy();
        let storage = match self.connector.connect(&url, policy).await {
            StorageOutcome::Connected(handle) => handle,
            StorageOutcome::Fatal(e) => {
                error!("Storage unavailable: {}", e);
                return Err(e.into());
            }
        };
        self.coordinator.attach_storage(storage.clone()).await;
        self.storage = Some(storage.clone());

        // Messaging never fails startup
        let status = self.messaging.connect().await;
        if !status.is_connected() {
            warn!("Continuing without messaging client");
        }
        self.coordinator.attach_messaging(self.messaging.clone()).await;

        let state = ServerState::new(
            storage,
            self.messaging.clone(),
            self.lifecycle.subscribe(),
            self.version.clone(),
        );
        let server = StatusServer::bind(&self.config.bind_address(), state)
            .await
            .map_err(|e| {
                error!("Failed to start status server: {}", e);
                e
            })?;
        self.status_addr = Some(server.local_addr());
        self.coordinator.attach_status_server(server).await;

        if self.signal_handlers {
            self.register_signal_handlers()?;
        }

        let next = if status.is_connected() {
            LifecycleState::Running
        } else {
            LifecycleState::Degraded
        };
        self.set_lifecycle(next);

        self.supervisor.ready().await;

        Ok(next)
    }
}
