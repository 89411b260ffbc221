use super::shutdown::ShutdownCoordinator;
use super::types::LifecycleState;
use crate::config::HostConfig;
use crate::messaging::{self, MessagingAdapter, MessagingClient};
use crate::storage::{SqlxDriver, StorageConnector, StorageDriver, StorageHandle};
use crate::supervisor::ProcessSupervisorBridge;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Main application coordinator that sequences the host's dependencies.
///
/// All collaborators are constructed once here and handed out explicitly;
/// nothing is reached through global state.
pub struct Orchestrator {
    pub(super) config: HostConfig,
    pub(super) version: String,

    // Components
    pub(super) connector: StorageConnector,
    pub(super) messaging: MessagingAdapter,
    pub(super) supervisor: ProcessSupervisorBridge,
    pub(super) storage: Option<StorageHandle>,
    pub(super) status_addr: Option<SocketAddr>,

    // Lifecycle management
    pub(super) lifecycle: watch::Sender<LifecycleState>,
    pub(super) coordinator: ShutdownCoordinator,
    pub(super) signal_handlers: bool,
}

impl Orchestrator {
    /// Create an orchestrator wired from configuration
    pub fn new(config: HostConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: HostConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config)
    }

    /// Handle for requesting shutdown from outside the orchestrator
    pub fn shutdown_coordinator(&self) -> ShutdownCoordinator {
        self.coordinator.clone()
    }

    /// Address the status server is bound to, once it is
    pub fn status_addr(&self) -> Option<SocketAddr> {
        self.status_addr
    }

    pub fn storage(&self) -> Option<&StorageHandle> {
        self.storage.as_ref()
    }

    pub fn messaging(&self) -> &MessagingAdapter {
        &self.messaging
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}

/// Builder for Orchestrator; lets callers swap any collaborator
pub struct OrchestratorBuilder {
    config: HostConfig,
    version: Option<String>,
    storage_driver: Option<Arc<dyn StorageDriver>>,
    messaging_client: Option<Option<Arc<dyn MessagingClient>>>,
    supervisor: Option<ProcessSupervisorBridge>,
    signal_handlers: bool,
}

impl OrchestratorBuilder {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            version: None,
            storage_driver: None,
            messaging_client: None,
            supervisor: None,
            signal_handlers: true,
        }
    }

    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_storage_driver(mut self, driver: Arc<dyn StorageDriver>) -> Self {
        self.storage_driver = Some(driver);
        self
    }

    /// Override the messaging client; `None` runs without one
    pub fn with_messaging_client(mut self, client: Option<Arc<dyn MessagingClient>>) -> Self {
        self.messaging_client = Some(client);
        self
    }

    pub fn with_supervisor(mut self, supervisor: ProcessSupervisorBridge) -> Self {
        self.supervisor = Some(supervisor);
        self
    }

    /// Whether SIGINT/SIGTERM handlers are installed during startup
    pub fn with_signal_handlers(mut self, enabled: bool) -> Self {
        self.signal_handlers = enabled;
        self
    }

    pub fn build(self) -> Orchestrator {
        let config = self.config;

        let driver: Arc<dyn StorageDriver> = match self.storage_driver {
            Some(driver) => driver,
            None => Arc::new(SqlxDriver::new(config.storage.connect_timeout())),
        };

        let messaging = match self.messaging_client {
            Some(client) => MessagingAdapter::new(
                client,
                config.messaging.connect_timeout(),
                config.messaging.disconnect_timeout(),
            ),
            None => messaging::adapter_from_config(&config.messaging),
        };

        let supervisor = self
            .supervisor
            .unwrap_or_else(|| ProcessSupervisorBridge::from_config(&config.supervisor));

        let coordinator = ShutdownCoordinator::new(
            supervisor.clone(),
            config.messaging.disconnect_timeout(),
            Duration::from_secs(config.server.drain_timeout_secs),
        );

        let (lifecycle, _) = watch::channel(LifecycleState::Starting);

        Orchestrator {
            version: self
                .version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            config,
            connector: StorageConnector::new(driver),
            messaging,
            supervisor,
            storage: None,
            status_addr: None,
            lifecycle,
            coordinator,
            signal_handlers: self.signal_handlers,
        }
    }
}
