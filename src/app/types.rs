use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Host lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Starting,
    /// Storage is up but the messaging client is not
    Degraded,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Degraded => "degraded",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What asked the host to shut down
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownSource {
    Signal(String),
    FatalError(String),
}

#[derive(Debug, Clone)]
pub struct ShutdownRequest {
    pub source: ShutdownSource,
    pub requested_at: DateTime<Utc>,
}

impl ShutdownRequest {
    pub fn signal<S: Into<String>>(name: S) -> Self {
        Self {
            source: ShutdownSource::Signal(name.into()),
            requested_at: Utc::now(),
        }
    }

    pub fn fatal<S: Into<String>>(message: S) -> Self {
        Self {
            source: ShutdownSource::FatalError(message.into()),
            requested_at: Utc::now(),
        }
    }

    /// Process exit code carried by this request
    pub fn exit_code(&self) -> i32 {
        match self.source {
            ShutdownSource::Signal(_) => 0,
            ShutdownSource::FatalError(_) => 1,
        }
    }
}

impl fmt::Display for ShutdownRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ShutdownSource::Signal(name) => write!(f, "signal {}", name),
            ShutdownSource::FatalError(message) => write!(f, "fatal error: {}", message),
        }
    }
}

/// Progress of the shutdown sequence as published by the coordinator
#[derive(Debug, Clone)]
pub enum ShutdownPhase {
    Idle,
    InProgress(ShutdownRequest),
    Complete(i32),
}
