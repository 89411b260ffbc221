use super::{LifecycleState, Orchestrator, ShutdownPhase, ShutdownRequest};
use crate::error::Result;
use tracing::{error, info};

impl Orchestrator {
    /// Run the host on its own task and return the process exit code.
    ///
    /// A panic anywhere in the host is routed through the shutdown
    /// coordinator as a fatal request.
    pub async fn launch(mut self) -> i32 {
        let coordinator = self.coordinator.clone();

        let failure = match tokio::spawn(async move { self.start().await }).await {
            Ok(code) => return code,
            Err(e) if e.is_panic() => "host task panicked".to_string(),
            Err(e) => format!("host task failed: {}", e),
        };

        error!("Bot host aborted: {}", failure);
        if let Some(code) = coordinator.shutdown(ShutdownRequest::fatal(failure)).await {
            return code;
        }

        let phase = coordinator.phases().borrow().clone();
        match phase {
            // Teardown finished before the panic surfaced
            ShutdownPhase::Complete(code) => code,
            _ => 1,
        }
    }

    /// Run the host to completion and return the process exit code
    pub async fn start(&mut self) -> i32 {
        self.set_lifecycle(LifecycleState::Starting);

        match self.startup().await {
            Ok(state) => {
                info!("Bot host is up ({})", state);
                self.run().await
            }
            Err(e) => {
                error!("Startup failed: {}", e);
                self.set_lifecycle(LifecycleState::ShuttingDown);
                let code = match self
                    .coordinator
                    .shutdown(ShutdownRequest::fatal(e.to_string()))
                    .await
                {
                    Some(code) => code,
                    None => self.coordinator.wait().await,
                };
                self.set_lifecycle(LifecycleState::Stopped);
                code
            }
        }
    }

    /// Wait for a shutdown to be requested and to finish
    pub(super) async fn run(&self) -> i32 {
        let mut phases = self.coordinator.phases();
        loop {
            let phase = phases.borrow_and_update().clone();
            match phase {
                ShutdownPhase::Idle => {}
                ShutdownPhase::InProgress(_) => {
                    self.set_lifecycle(LifecycleState::ShuttingDown);
                }
                ShutdownPhase::Complete(code) => {
                    self.set_lifecycle(LifecycleState::ShuttingDown);
                    self.set_lifecycle(LifecycleState::Stopped);
                    return code;
                }
            }

            if phases.changed().await.is_err() {
                error!("Shutdown coordinator went away");
                self.set_lifecycle(LifecycleState::Stopped);
                return 1;
            }
        }
    }

    /// Route SIGINT and SIGTERM to the shutdown coordinator
    pub(super) fn register_signal_handlers(&self) -> Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = signal(SignalKind::terminate())?;
            let coordinator = self.coordinator.clone();
            tokio::spawn(async move {
                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    coordinator.shutdown(ShutdownRequest::signal("SIGTERM")).await;
                }
            });

            let mut sigint = signal(SignalKind::interrupt())?;
            let coordinator = self.coordinator.clone();
            tokio::spawn(async move {
                if sigint.recv().await.is_some() {
                    info!("Received SIGINT signal (Ctrl+C)");
                    coordinator.shutdown(ShutdownRequest::signal("SIGINT")).await;
                }
            });
        }

        #[cfg(not(unix))]
        {
            let coordinator = self.coordinator.clone();
            tokio::spawn(async move {
                if let Ok(()) = tokio::signal::ctrl_c().await {
                    info!("Received SIGINT signal (Ctrl+C)");
                    coordinator.shutdown(ShutdownRequest::signal("SIGINT")).await;
                }
            });
        }

        Ok(())
    }
}
