//! Session lifecycle: validated start, idempotent stop, status snapshots

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::MonitorLoop;
use crate::fetcher::Credentials;
use crate::session::{AlertRow, SessionHandle, SessionPhase};

/// Outcome of a start request
#[derive(Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started { username: String },
    AlreadyRunning,
    Invalid,
}

impl StartOutcome {
    pub fn message(&self) -> String {
        match self {
            StartOutcome::Started { username } => {
                format!("Monitoring started for {}.", username)
            }
            StartOutcome::AlreadyRunning => "Monitoring is already started.".to_string(),
            StartOutcome::Invalid => {
                "Please provide both username and password to start monitoring.".to_string()
            }
        }
    }
}

/// Outcome of a stop request
#[derive(Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped { shutdown: bool },
    NotStarted,
}

impl StopOutcome {
    pub fn message(&self) -> String {
        match self {
            StopOutcome::Stopped { shutdown: true } => {
                "Monitoring stopped. Server will shut down.".to_string()
            }
            StopOutcome::Stopped { shutdown: false } => "Monitoring stopped.".to_string(),
            StopOutcome::NotStarted => {
                "Monitoring is not started yet, stopping is not possible.".to_string()
            }
        }
    }
}

/// Point-in-time view of the session for the presentation surface
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub phase: SessionPhase,
    pub message: String,
    pub rows: Vec<AlertRow>,
}

struct ActiveWorker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Serializes start/stop transitions so concurrent calls resolve to one
/// consistent final state. At most one worker task exists at a time.
pub struct MonitorController {
    worker: Mutex<Option<ActiveWorker>>,
    engine: Arc<MonitorLoop>,
    session: SessionHandle,
    shutdown_on_stop: bool,
    process_cancel: CancellationToken,
}

impl MonitorController {
    pub fn new(
        engine: Arc<MonitorLoop>,
        session: SessionHandle,
        shutdown_on_stop: bool,
        process_cancel: CancellationToken,
    ) -> Self {
        Self {
            worker: Mutex::new(None),
            engine,
            session,
            shutdown_on_stop,
            process_cancel,
        }
    }

    /// Start a monitoring session. Rejects empty credentials, refuses while
    /// a worker is live, and otherwise resets the session and spawns the
    /// polling loop.
    pub async fn start(&self, username: &str, password: &str) -> StartOutcome {
        if username.is_empty() || password.is_empty() {
            return StartOutcome::Invalid;
        }

        let mut worker = self.worker.lock().await;

        if let Some(active) = worker.as_mut() {
            if active.cancel.is_cancelled() || active.handle.is_finished() {
                // Previous session is winding down after a stop; let it
                // finish before reusing the slot
                let _ = (&mut active.handle).await;
            } else {
                return StartOutcome::AlreadyRunning;
            }
        }
        *worker = None;

        let outcome = StartOutcome::Started {
            username: username.to_string(),
        };
        self.session.write().await.begin(outcome.message());

        let cancel = CancellationToken::new();
        let engine = Arc::clone(&self.engine);
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let worker_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            engine.run(credentials, worker_cancel).await;
        });

        *worker = Some(ActiveWorker { cancel, handle });
        tracing::info!("Monitoring session started for '{}'", username);
        outcome
    }

    /// Request a stop. The worker observes the cancellation within one poll
    /// interval. Repeated stops are no-ops; stopping before any start
    /// reports that nothing is running.
    pub async fn stop(&self) -> StopOutcome {
        let worker = self.worker.lock().await;

        let Some(active) = worker.as_ref() else {
            return StopOutcome::NotStarted;
        };

        // CancellationToken::cancel is idempotent, so a repeated stop has
        // no side effects beyond the first
        let first_stop = !active.cancel.is_cancelled();
        active.cancel.cancel();

        if first_stop {
            let mut session = self.session.write().await;
            if session.phase == SessionPhase::Running {
                session.phase = SessionPhase::Stopping;
                session.set_status("Monitoring stopping.".to_string());
            }
            tracing::info!("Monitoring session stop requested");
        }

        if self.shutdown_on_stop {
            self.process_cancel.cancel();
        }

        StopOutcome::Stopped {
            shutdown: self.shutdown_on_stop,
        }
    }

    /// Snapshot the session for display
    pub async fn status(&self) -> StatusSnapshot {
        let session = self.session.read().await;
        StatusSnapshot {
            phase: session.phase,
            message: session.last_status.clone(),
            rows: session.rows.clone(),
        }
    }
}
