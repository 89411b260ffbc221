pub mod app;
pub mod config;
pub mod error;
pub mod messaging;
pub mod retry;
pub mod status;
pub mod storage;
pub mod supervisor;

pub use app::{
    LifecycleState, Orchestrator, OrchestratorBuilder, ShutdownCoordinator, ShutdownPhase,
    ShutdownRequest, ShutdownSource,
};
pub use config::HostConfig;
pub use error::{HostError, Result};
pub use messaging::{DisconnectOutcome, MessagingAdapter, MessagingClient, MessagingStatus};
pub use retry::{ConnectionAttempt, RetryPolicy};
pub use status::{HealthSnapshot, ServerState, StatusServer};
pub use storage::{StorageConnector, StorageDriver, StorageHandle, StorageOutcome, StorageTarget};
pub use supervisor::{ProcessSupervisor, ProcessSupervisorBridge, SupervisorAck};
