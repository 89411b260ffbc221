mod connector;
mod driver;
mod target;

#[cfg(test)]
mod tests;

pub use connector::{StorageConnector, StorageOutcome};
pub use driver::{SqlxDriver, StorageDriver};
pub use target::{redact, StorageTarget};

use sqlx::AnyPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Live storage connection produced by a successful connect.
///
/// Cheap to clone; all clones observe the same connection state.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    target: StorageTarget,
    pool: AnyPool,
    connected: Arc<AtomicBool>,
}

impl StorageHandle {
    pub(crate) fn new(target: StorageTarget, pool: AnyPool) -> Self {
        Self {
            target,
            pool,
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn target(&self) -> &StorageTarget {
        &self.target
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Last known connection state
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.pool.is_closed()
    }

    /// Close the pool, waiting at most `limit` for checked-out connections
    pub async fn close(&self, limit: Duration) {
        self.connected.store(false, Ordering::Release);

        if timeout(limit, self.pool.close()).await.is_err() {
            warn!(
                "Storage pool for {} did not close within {:?}",
                self.target.redacted(),
                limit
            );
        } else {
            info!("Storage connection closed");
        }
    }
}
