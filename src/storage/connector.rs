use super::driver::StorageDriver;
use super::target::StorageTarget;
use super::StorageHandle;
use crate::error::StorageError;
use crate::retry::{ConnectionAttempt, RetryPolicy};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Result of bringing up persistent storage
#[derive(Debug)]
pub enum StorageOutcome {
    Connected(StorageHandle),
    Fatal(StorageError),
}

/// Establishes the storage connection with bounded retries and a single
/// provisioning fallback for file-backed targets that do not exist yet
pub struct StorageConnector {
    driver: Arc<dyn StorageDriver>,
}

impl StorageConnector {
    pub fn new(driver: Arc<dyn StorageDriver>) -> Self {
        Self { driver }
    }

    pub async fn connect(&self, url: &str, policy: RetryPolicy) -> StorageOutcome {
        let target = match StorageTarget::parse(url) {
            Ok(target) => target,
            Err(e) => {
                error!("Rejected storage target: {}", e);
                return StorageOutcome::Fatal(e);
            }
        };

        prepare_directory(&target).await;

        let mut attempt = ConnectionAttempt::new(target.redacted(), policy);
        let mut last_error = None;

        while attempt.begin() {
            info!(
                "Connecting to storage {} (attempt {}/{})",
                attempt.target(),
                attempt.count(),
                attempt.max_attempts()
            );

            match self.driver.authenticate(&target).await {
                Ok(pool) => {
                    info!("Storage connected: {}", attempt.target());
                    return StorageOutcome::Connected(StorageHandle::new(target, pool));
                }
                Err(e) => {
                    let transient = e.is_transient();
                    warn!(
                        "Storage attempt {}/{} failed: {}",
                        attempt.count(),
                        attempt.max_attempts(),
                        e
                    );
                    last_error = Some(e);

                    if !transient || attempt.is_exhausted() {
                        break;
                    }

                    let delay = attempt.backoff();
                    info!("Retrying storage connection in {:?}", delay);
                    sleep(delay).await;
                }
            }
        }

        let last_error = last_error.unwrap_or_else(|| StorageError::Provision {
            target: target.redacted(),
            details: "no connection attempt was made".to_string(),
        });

        error!(
            "Unable to connect to storage {} after {} attempt(s): {}",
            attempt.target(),
            attempt.count(),
            last_error
        );

        if !target.is_missing_file() {
            return StorageOutcome::Fatal(last_error);
        }

        self.fallback(target).await
    }

    /// One-shot creation of a missing file-backed database, then re-authenticate
    async fn fallback(&self, target: StorageTarget) -> StorageOutcome {
        info!("Attempting to create storage at {}", target.redacted());

        if let Err(e) = self.driver.provision(&target).await {
            error!("Failed to create storage: {}", e);
            return StorageOutcome::Fatal(e);
        }

        match self.driver.authenticate(&target).await {
            Ok(pool) => {
                info!("Storage created and connected: {}", target.redacted());
                StorageOutcome::Connected(StorageHandle::new(target, pool))
            }
            Err(e) => {
                error!("Storage created but authentication failed: {}", e);
                StorageOutcome::Fatal(e)
            }
        }
    }
}

/// Make sure the directory of a file-backed target exists before connecting
async fn prepare_directory(target: &StorageTarget) {
    let Some(parent) = target
        .file_path()
        .and_then(|path| path.parent())
        .filter(|parent| !parent.as_os_str().is_empty())
    else {
        return;
    };

    if parent.exists() {
        return;
    }

    match tokio::fs::create_dir_all(parent).await {
        Ok(()) => info!("Created storage directory {}", parent.display()),
        Err(e) => warn!(
            "Could not create storage directory {}: {}",
            parent.display(),
            e
        ),
    }
}
