//! Alert sink trait and the text-to-speech notifier

use async_trait::async_trait;

use crate::config::NotifierConfig;

/// Trait for raising a user-facing alert
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "speech")
    fn type_name(&self) -> &str;

    /// Raise an alert with the given message
    async fn notify(&self, message: &str) -> crate::Result<()>;
}

/// Speaks the alert message by invoking a text-to-speech command
#[derive(Debug)]
pub struct SpeechNotifier {
    command: String,
}

impl SpeechNotifier {
    pub fn new(config: &NotifierConfig) -> Self {
        let NotifierConfig::Speech { command } = config;
        tracing::debug!("Created SpeechNotifier using command '{}'", command);
        Self {
            command: command.clone(),
        }
    }
}

#[async_trait]
impl Notifier for SpeechNotifier {
    fn type_name(&self) -> &str {
        "speech"
    }

    async fn notify(&self, message: &str) -> crate::Result<()> {
        tracing::debug!("Speaking alert via '{}'", self.command);

        let output = tokio::process::Command::new(&self.command)
            .arg(message)
            .output()
            .await
            .map_err(|e| {
                crate::HydramonError::Notifier(format!(
                    "Failed to run speech command '{}': {}",
                    self.command, e
                ))
            })?;

        if !output.status.success() {
            return Err(crate::HydramonError::Notifier(format!(
                "Speech command '{}' exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}
