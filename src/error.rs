use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Status server error: {0}")]
    Status(#[from] StatusError),

    #[error("System error: {message}")]
    System { message: String },
}

impl HostError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

/// Failures raised while bringing up persistent storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage target '{target}': {details}")]
    InvalidTarget { target: String, details: String },

    #[error("Storage file {path} does not exist")]
    Missing { path: String },

    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Connection to {target} timed out after {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    #[error("Failed to provision {target}: {details}")]
    Provision { target: String, details: String },
}

impl StorageError {
    /// Whether another attempt against the same target could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Timeout { .. } => true,
            StorageError::Connect { source, .. } => matches!(
                source,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            StorageError::InvalidTarget { .. }
            | StorageError::Missing { .. }
            | StorageError::Provision { .. } => false,
        }
    }
}

/// Failures raised by the messaging client
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("No messaging endpoint configured")]
    NotConfigured,

    #[error("Messaging connect failed: {details}")]
    Connect { details: String },

    #[error("Messaging {operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Messaging disconnect failed: {details}")]
    Disconnect { details: String },
}

/// Failures raised by the HTTP status surface
#[derive(Error, Debug)]
pub enum StatusError {
    #[error("Failed to bind status server to {address}: {source}")]
    BindFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Status server failed: {details}")]
    Serve { details: String },
}

/// Failures raised while talking to a process supervisor
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Supervisor socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported supervisor socket address: {address}")]
    Unsupported { address: String },
}

pub type Result<T> = std::result::Result<T, HostError>;
