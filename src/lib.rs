//! Hydramon - Hydra alarm monitoring and notification service
//!
//! Polls a log-search API for the freshest alarm event, alerts when an
//! alarm goes red, and serves a dashboard for starting and stopping the
//! monitoring session.

pub mod config;
pub mod controller;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod io;
pub mod notifier;
pub mod qualifier;
pub mod session;

pub use config::{load_config, Config};
pub use error::{HydramonError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::NotifierConfig;
use crate::controller::MonitorController;
use crate::engine::MonitorLoop;
use crate::fetcher::LogFetcher;
use crate::notifier::{Notifier, SpeechNotifier};

/// Run the hydramon service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let http: Arc<dyn io::HttpClient> = Arc::new(io::ReqwestHttpClient::new(
        config.settings.insecure_skip_tls_verify,
    )?);
    let process_cancel = CancellationToken::new();

    // Build the fetcher and notifiers
    let fetcher = Arc::new(LogFetcher::new(&config.settings, Arc::clone(&http)));
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
    for notifier_config in &config.notifiers {
        let notifier: Arc<dyn Notifier> = match notifier_config {
            NotifierConfig::Speech { .. } => Arc::new(SpeechNotifier::new(notifier_config)),
        };
        notifiers.push(notifier);
    }

    // Build session state, loop, and controller
    let session = session::new_session_handle();
    let engine = Arc::new(MonitorLoop::new(
        &config.settings,
        fetcher,
        notifiers,
        Arc::clone(&session),
    ));
    let controller = Arc::new(MonitorController::new(
        engine,
        Arc::clone(&session),
        config.settings.shutdown_on_stop,
        process_cancel.clone(),
    ));

    // Setup shutdown handler
    let cancel_for_signal = process_cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c");
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    if config.dashboard.enabled {
        let router = dashboard::build_router(Arc::clone(&controller));
        let addr = SocketAddr::from(([0, 0, 0, 0], config.dashboard.port));
        tracing::info!("Dashboard listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let cancel_for_server = process_cancel.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_for_server.cancelled().await;
            })
            .await
            .ok();
    } else {
        process_cancel.cancelled().await;
    }

    // Wind down any session still polling before the process exits
    let _ = controller.stop().await;
    tracing::info!("hydramon stopped");

    Ok(())
}
