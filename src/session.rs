//! Shared session state for the monitoring loop and the dashboard

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::qualifier::Event;

/// Lifecycle phase of the monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Running,
    Stopping,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::Running => write!(f, "Running"),
            SessionPhase::Stopping => write!(f, "Stopping"),
        }
    }
}

/// One alerting event, as displayed in the dashboard table.
/// Append-only; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRow {
    pub name: String,
    pub status_color: String,
    pub statement: String,
    pub status_code: String,
}

impl From<&Event> for AlertRow {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            status_color: event.status_color.clone(),
            statement: event.statement.clone(),
            status_code: event.status_code.clone(),
        }
    }
}

/// Shared state accessible by the loop, controller, and dashboard
#[derive(Debug)]
pub struct MonitorSession {
    pub phase: SessionPhase,
    pub last_status: String,
    pub rows: Vec<AlertRow>,
}

impl MonitorSession {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            last_status: "Monitoring is not started yet.".to_string(),
            rows: Vec::new(),
        }
    }

    /// Transition into a fresh running session, clearing accumulated rows
    pub fn begin(&mut self, status: String) {
        self.phase = SessionPhase::Running;
        self.last_status = status;
        self.rows.clear();
    }

    pub fn set_status(&mut self, status: String) {
        tracing::info!("{}", status);
        self.last_status = status;
    }

    pub fn push_row(&mut self, row: AlertRow) {
        self.rows.push(row);
    }
}

impl Default for MonitorSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe session handle
pub type SessionHandle = Arc<RwLock<MonitorSession>>;

pub fn new_session_handle() -> SessionHandle {
    Arc::new(RwLock::new(MonitorSession::new()))
}
