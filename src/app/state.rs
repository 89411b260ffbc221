use super::{LifecycleState, Orchestrator};
use tokio::sync::watch;
use tracing::{debug, info};

impl Orchestrator {
    /// Move the host to `state`
    pub(super) fn set_lifecycle(&self, state: LifecycleState) {
        let previous = self.lifecycle.send_replace(state);
        if previous != state {
            info!("Lifecycle: {} -> {}", previous, state);
        } else {
            debug!("Lifecycle unchanged: {}", state);
        }
    }

    /// Current lifecycle state
    pub fn lifecycle_state(&self) -> LifecycleState {
        *self.lifecycle.borrow()
    }

    /// Observe lifecycle transitions
    pub fn lifecycle(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }
}
