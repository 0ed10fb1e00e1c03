//! Configuration types for the hydramon service

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub settings: Settings,
    #[serde(default = "default_notifiers")]
    pub notifiers: Vec<NotifierConfig>,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Required settings for the monitoring loop and the search backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Message spoken when an alarm goes red
    pub tts_alert_message: String,
    /// Poll interval, also the freshness window for alerting
    pub wait_time_seconds: u64,
    /// Search API endpoint URL
    pub url: String,
    /// Value for the Host header
    pub host: String,
    /// Value for the User-Agent header
    pub user_agent: String,
    /// Value for the Content-Type header
    pub content_type: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Search term matched against the alarm stream
    #[serde(default = "default_query")]
    pub query: String,
    /// Skip TLS certificate verification when talking to the search API.
    /// Insecure; only for backends with self-signed certificates.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
    /// When true, stopping the monitor also shuts the whole process down
    #[serde(default)]
    pub shutdown_on_stop: bool,
    /// Upper bound on a single notifier invocation
    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_seconds: u64,
}

/// Notifier configuration with tagged enum for extensibility
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifierConfig {
    #[serde(rename = "speech")]
    Speech {
        #[serde(default = "default_speech_command")]
        command: String,
    },
}

impl NotifierConfig {
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Speech { .. } => "speech",
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

fn default_notifiers() -> Vec<NotifierConfig> {
    vec![NotifierConfig::Speech {
        command: default_speech_command(),
    }]
}

fn default_referer() -> String {
    "https://portal.dimon.telecomitalia.local:20443/s/flycbe/app/hydra_react".to_string()
}

fn default_query() -> String {
    "FLY_CBE WETIM".to_string()
}

fn default_notify_timeout() -> u64 {
    5
}

fn default_speech_command() -> String {
    "espeak".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::HydramonError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content).map_err(|e| {
        crate::HydramonError::Config(format!("Failed to parse config file {:?}: {}", path, e))
    })?;
    Ok(config)
}
