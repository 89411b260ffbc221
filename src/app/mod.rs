mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use shutdown::ShutdownCoordinator;
pub use types::{LifecycleState, ShutdownPhase, ShutdownRequest, ShutdownSource};
