use super::target::StorageTarget;
use crate::error::StorageError;
use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{AnyPool, ConnectOptions, Connection};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Low-level access to a storage engine.
///
/// The connector owns retry and fallback policy; a driver only knows how to
/// open a verified pool and how to create a file-backed database from scratch.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Open a pool against `target` and verify it answers queries
    async fn authenticate(&self, target: &StorageTarget) -> Result<AnyPool, StorageError>;

    /// Create and initialize the database file behind `target`
    async fn provision(&self, target: &StorageTarget) -> Result<(), StorageError>;
}

/// Driver backed by sqlx's runtime-selected `Any` pool
pub struct SqlxDriver {
    connect_timeout: Duration,
    max_connections: u32,
}

impl SqlxDriver {
    pub fn new(connect_timeout: Duration) -> Self {
        sqlx::any::install_default_drivers();
        Self {
            connect_timeout,
            max_connections: 5,
        }
    }
}

#[async_trait]
impl StorageDriver for SqlxDriver {
    async fn authenticate(&self, target: &StorageTarget) -> Result<AnyPool, StorageError> {
        if let Some(path) = target.file_path() {
            if !path.exists() {
                return Err(StorageError::Missing {
                    path: path.display().to_string(),
                });
            }
        }

        // Each in-memory sqlite connection is its own database
        let max_connections = match target {
            StorageTarget::Memory { .. } => 1,
            _ => self.max_connections,
        };

        let connect = async {
            let pool = AnyPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(self.connect_timeout)
                .connect(target.url())
                .await?;
            sqlx::query("SELECT 1").execute(&pool).await?;
            Ok::<_, sqlx::Error>(pool)
        };

        match timeout(self.connect_timeout, connect).await {
            Ok(Ok(pool)) => {
                debug!("Storage pool verified for {}", target.redacted());
                Ok(pool)
            }
            Ok(Err(source)) => Err(StorageError::Connect {
                target: target.redacted(),
                source,
            }),
            Err(_) => Err(StorageError::Timeout {
                target: target.redacted(),
                timeout: self.connect_timeout,
            }),
        }
    }

    async fn provision(&self, target: &StorageTarget) -> Result<(), StorageError> {
        let path = target.file_path().ok_or_else(|| StorageError::Provision {
            target: target.redacted(),
            details: "target is not file-backed".to_string(),
        })?;

        let provision_err = |details: String| StorageError::Provision {
            target: target.redacted(),
            details,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| provision_err(format!("creating {}: {}", parent.display(), e)))?;
        }

        let mut conn = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .connect()
            .await
            .map_err(|e| provision_err(e.to_string()))?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&mut conn)
            .await
            .map_err(|e| provision_err(e.to_string()))?;

        let user_version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&mut conn)
            .await
            .map_err(|e| provision_err(e.to_string()))?;

        conn.close()
            .await
            .map_err(|e| provision_err(e.to_string()))?;

        info!(
            "Provisioned sqlite database at {} (user_version {})",
            path.display(),
            user_version
        );
        Ok(())
    }
}
