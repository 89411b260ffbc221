use super::types::{ShutdownPhase, ShutdownRequest};
use crate::messaging::{DisconnectOutcome, MessagingAdapter};
use crate::status::StatusServer;
use crate::storage::StorageHandle;
use crate::supervisor::ProcessSupervisorBridge;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

/// Components the coordinator tears down, attached as they come up
#[derive(Default)]
struct Teardown {
    status_server: Option<StatusServer>,
    messaging: Option<MessagingAdapter>,
    storage: Option<StorageHandle>,
}

struct CoordinatorInner {
    started: AtomicBool,
    teardown: Mutex<Teardown>,
    supervisor: ProcessSupervisorBridge,
    phase: watch::Sender<ShutdownPhase>,
    disconnect_timeout: Duration,
    drain_timeout: Duration,
}

/// Single-flight, ordered teardown of the host.
///
/// Clones share one guard, so any number of concurrent triggers collapse
/// into exactly one teardown sequence.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl ShutdownCoordinator {
    pub fn new(
        supervisor: ProcessSupervisorBridge,
        disconnect_timeout: Duration,
        drain_timeout: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(ShutdownPhase::Idle);
        Self {
            inner: Arc::new(CoordinatorInner {
                started: AtomicBool::new(false),
                teardown: Mutex::new(Teardown::default()),
                supervisor,
                phase,
                disconnect_timeout,
                drain_timeout,
            }),
        }
    }

    pub async fn attach_status_server(&self, server: StatusServer) {
        let mut teardown = self.inner.teardown.lock().await;
        if self.is_shutting_down() {
            server.stop_accepting();
        }
        teardown.status_server = Some(server);
    }

    pub async fn attach_messaging(&self, messaging: MessagingAdapter) {
        self.inner.teardown.lock().await.messaging = Some(messaging);
    }

    pub async fn attach_storage(&self, storage: StorageHandle) {
        self.inner.teardown.lock().await.storage = Some(storage);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Observe shutdown progress
    pub fn phases(&self) -> watch::Receiver<ShutdownPhase> {
        self.inner.phase.subscribe()
    }

    /// Run the teardown sequence for `request`.
    ///
    /// Only the first caller executes it and receives the exit code; every
    /// later caller gets `None` immediately.
    pub async fn shutdown(&self, request: ShutdownRequest) -> Option<i32> {
        if self
            .inner
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Shutdown already in progress, ignoring {}", request);
            return None;
        }

        info!(
            "Shutting down ({}), requested at {}",
            request,
            request.requested_at.to_rfc3339()
        );
        let exit_code = request.exit_code();
        self.inner
            .phase
            .send_replace(ShutdownPhase::InProgress(request));

        let mut teardown = self.inner.teardown.lock().await;

        if let Some(server) = &teardown.status_server {
            server.stop_accepting();
        }

        if let Some(messaging) = teardown.messaging.take() {
            match messaging.disconnect().await {
                DisconnectOutcome::Ack | DisconnectOutcome::Skipped => {}
                DisconnectOutcome::Timeout => {
                    warn!("Messaging client did not disconnect in time")
                }
                DisconnectOutcome::Failed(reason) => {
                    warn!("Messaging client disconnect failed: {}", reason)
                }
            }
        }

        if let Some(server) = teardown.status_server.take() {
            server.drain(self.inner.drain_timeout).await;
        }

        if let Some(storage) = teardown.storage.take() {
            storage.close(self.inner.disconnect_timeout).await;
        }

        self.inner.supervisor.stop().await;

        info!("Shutdown complete, exiting with code {}", exit_code);
        self.inner
            .phase
            .send_replace(ShutdownPhase::Complete(exit_code));

        Some(exit_code)
    }

    /// Wait for a teardown started elsewhere and return its exit code
    pub async fn wait(&self) -> i32 {
        let mut phases = self.phases();
        loop {
            if let ShutdownPhase::Complete(code) = &*phases.borrow_and_update() {
                return *code;
            }
            if phases.changed().await.is_err() {
                return 1;
            }
        }
    }
}
