//! The monitoring loop: fetch, qualify, alert or report, sleep, repeat

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::fetcher::{Credentials, LogFetcher};
use crate::notifier::Notifier;
use crate::qualifier::{qualify, QualifyOutcome};
use crate::session::{AlertRow, SessionHandle, SessionPhase};

/// Runs the poll cycle for one monitoring session
pub struct MonitorLoop {
    fetcher: Arc<LogFetcher>,
    notifiers: Vec<Arc<dyn Notifier>>,
    session: SessionHandle,
    interval: Duration,
    freshness_window_seconds: u64,
    alert_message: String,
    notify_timeout: Duration,
}

impl MonitorLoop {
    pub fn new(
        settings: &Settings,
        fetcher: Arc<LogFetcher>,
        notifiers: Vec<Arc<dyn Notifier>>,
        session: SessionHandle,
    ) -> Self {
        Self {
            fetcher,
            notifiers,
            session,
            interval: Duration::from_secs(settings.wait_time_seconds),
            freshness_window_seconds: settings.wait_time_seconds,
            alert_message: settings.tts_alert_message.clone(),
            notify_timeout: Duration::from_secs(settings.notify_timeout_seconds),
        }
    }

    /// Poll until the cancellation token is triggered. The token is checked
    /// before each cycle and raced against both the cycle itself and the
    /// inter-cycle sleep, so a stop request is observed within one interval
    /// even when the backend hangs mid-fetch.
    pub async fn run(&self, credentials: Credentials, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let (status, row) = tokio::select! {
                outcome = self.cycle(&credentials) => outcome,
                _ = cancel.cancelled() => {
                    tracing::debug!("Monitoring loop cancelled mid-cycle");
                    break;
                }
            };
            {
                let mut session = self.session.write().await;
                if let Some(row) = row {
                    session.push_row(row);
                }
                session.set_status(status);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!("Monitoring loop cancelled");
                    break;
                }
            }
        }

        let mut session = self.session.write().await;
        session.phase = SessionPhase::Idle;
        session.set_status("Monitoring stopped.".to_string());
    }

    /// One fetch-qualify-act cycle. Always yields exactly one status string;
    /// a row comes back only when the event is alertable.
    async fn cycle(&self, credentials: &Credentials) -> (String, Option<AlertRow>) {
        let result = match self.fetcher.fetch(credentials).await {
            Ok(result) => result,
            Err(e) => return (e.to_string(), None),
        };

        match qualify(&result, Utc::now(), self.freshness_window_seconds) {
            QualifyOutcome::NoData => ("No data found in the response.".to_string(), None),
            QualifyOutcome::Malformed(detail) => {
                (format!("Error processing response data: {}", detail), None)
            }
            QualifyOutcome::Stale { event, age_seconds } => {
                tracing::debug!(
                    "Top event aged {}s exceeds {}s window",
                    age_seconds,
                    self.freshness_window_seconds
                );
                (
                    format!(
                        "Log entry is older than {:.1} minute(s), skipping alert. Timestamp: {}",
                        self.freshness_window_seconds as f64 / 60.0,
                        event.timestamp_raw
                    ),
                    None,
                )
            }
            QualifyOutcome::Informational(event) => (
                format!("Notification status color: {}", event.status_color),
                None,
            ),
            QualifyOutcome::Alertable(event) => {
                // Re-alerts on every cycle while the event stays red and
                // fresh; an unresolved alarm keeps making noise.
                self.raise_alert().await;
                (
                    format!(
                        "ALERT! Notification status color is RED for {} at {}.",
                        event.name, event.timestamp_raw
                    ),
                    Some(AlertRow::from(&event)),
                )
            }
        }
    }

    /// Invoke every notifier, bounded by the notify timeout. Failures are
    /// logged and swallowed; a hung backend never stalls the loop.
    async fn raise_alert(&self) {
        for notifier in &self.notifiers {
            match tokio::time::timeout(self.notify_timeout, notifier.notify(&self.alert_message))
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!("Notifier '{}' failed: {}", notifier.type_name(), e);
                }
                Err(_) => {
                    tracing::warn!(
                        "Notifier '{}' timed out after {:?}",
                        notifier.type_name(),
                        self.notify_timeout
                    );
                }
            }
        }
    }
}
