//! Optional integration with the service manager that runs this process.
//!
//! The capability is decided once from configuration. When no supervisor is
//! configured every call takes the no-op path and reports `Unavailable`.

use crate::config::SupervisorConfig;
use crate::error::SupervisorError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A process supervisor we can report lifecycle milestones to
#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    fn name(&self) -> &str;

    /// Startup finished and the process is serving
    async fn ready(&self) -> Result<(), SupervisorError>;

    /// The process is tearing down
    async fn stop(&self) -> Result<(), SupervisorError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SupervisorAck {
    Ack,
    Unavailable,
}

/// sd_notify client writing to the socket named by `NOTIFY_SOCKET`
#[cfg(unix)]
pub struct SystemdNotifier {
    socket_path: std::path::PathBuf,
}

#[cfg(unix)]
impl SystemdNotifier {
    pub fn new(address: &str) -> Result<Self, SupervisorError> {
        // Abstract-namespace sockets are not reachable through a path
        if address.starts_with('@') || address.is_empty() {
            return Err(SupervisorError::Unsupported {
                address: address.to_string(),
            });
        }

        Ok(Self {
            socket_path: address.into(),
        })
    }

    async fn notify(&self, state: &str) -> Result<(), SupervisorError> {
        let socket = tokio::net::UnixDatagram::unbound()?;
        socket.send_to(state.as_bytes(), &self.socket_path).await?;
        debug!("sd_notify {:?} -> {}", state, self.socket_path.display());
        Ok(())
    }
}

#[cfg(unix)]
#[async_trait]
impl ProcessSupervisor for SystemdNotifier {
    fn name(&self) -> &str {
        "systemd"
    }

    async fn ready(&self) -> Result<(), SupervisorError> {
        self.notify("READY=1").await
    }

    async fn stop(&self) -> Result<(), SupervisorError> {
        self.notify("STOPPING=1").await
    }
}

/// Never-failing front for an optional supervisor
#[derive(Clone, Default)]
pub struct ProcessSupervisorBridge {
    supervisor: Option<Arc<dyn ProcessSupervisor>>,
}

impl ProcessSupervisorBridge {
    pub fn new(supervisor: Option<Arc<dyn ProcessSupervisor>>) -> Self {
        Self { supervisor }
    }

    pub fn from_config(config: &SupervisorConfig) -> Self {
        let Some(address) = config.notify_socket.as_deref() else {
            return Self::default();
        };

        #[cfg(unix)]
        {
            match SystemdNotifier::new(address) {
                Ok(notifier) => {
                    info!("Process supervisor integration enabled (systemd)");
                    Self::new(Some(Arc::new(notifier)))
                }
                Err(e) => {
                    warn!("Process supervisor integration disabled: {}", e);
                    Self::default()
                }
            }
        }

        #[cfg(not(unix))]
        {
            warn!(
                "Process supervisor socket {} ignored on this platform",
                address
            );
            Self::default()
        }
    }

    pub fn is_available(&self) -> bool {
        self.supervisor.is_some()
    }

    pub async fn ready(&self) -> SupervisorAck {
        let Some(supervisor) = &self.supervisor else {
            return SupervisorAck::Unavailable;
        };

        match supervisor.ready().await {
            Ok(()) => SupervisorAck::Ack,
            Err(e) => {
                warn!("Failed to report readiness to {}: {}", supervisor.name(), e);
                SupervisorAck::Unavailable
            }
        }
    }

    pub async fn stop(&self) -> SupervisorAck {
        let Some(supervisor) = &self.supervisor else {
            info!("Process supervisor not used or not available, continuing shutdown");
            return SupervisorAck::Unavailable;
        };

        match supervisor.stop().await {
            Ok(()) => {
                info!("Notified {} of shutdown", supervisor.name());
                SupervisorAck::Ack
            }
            Err(e) => {
                warn!(
                    "Could not notify {} of shutdown, continuing: {}",
                    supervisor.name(),
                    e
                );
                SupervisorAck::Unavailable
            }
        }
    }
}
