//! Bootlace server core
//!
//! The composition root: owns the boot-state registry, the compiled
//! mapping bindings and the parsed template sets, and runs the
//! background services (state reaper, hot-reload coordinator) for the
//! life of the process.
//!
//! The serving layer is a consumer of this crate: it resolves boot
//! scripts through [`App::resolve`] and tracks machine progress through
//! [`App::registry`]; nothing here depends on how requests arrive.

pub mod app;
pub mod config;
pub mod watcher;

pub use app::App;
pub use config::ServerConfig;
pub use watcher::{classify, WatchAction, WatchError, DATA_SUBDIRS, WATCHED_SUBDIRS};

use bootlace_registry::{reaper, ReaperConfig};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

/// Build the application state and run until shutdown.
///
/// Fatal conditions: initial compile/parse failures, watch subscription
/// failures, and a watcher that dies at runtime — the process must not
/// keep serving with a silently dead watcher. A clean Ctrl-C/SIGTERM
/// shutdown returns `Ok`.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let app = Arc::new(App::new(config)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let (fatal_tx, mut fatal_rx) = mpsc::channel(1);

    let reaper_task = reaper::spawn(
        app.registry.clone(),
        ReaperConfig::default(),
        shutdown_rx.clone(),
    );
    let watcher_task = watcher::spawn(app.clone(), shutdown_rx.clone(), fatal_tx)?;

    info!("bootlace core running");

    let result = tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received");
            Ok(())
        }
        fatal = fatal_rx.recv() => {
            match fatal {
                Some(e) => {
                    error!(error = %e, "watch subsystem failed");
                    Err(anyhow::Error::new(e).context("watch subsystem failed"))
                }
                None => Ok(()),
            }
        }
    };

    // Cooperative shutdown for the background loops
    let _ = shutdown_tx.send(());
    let _ = watcher_task.await;
    let _ = reaper_task.await;
    info!("shutdown complete");

    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sig) = signal(SignalKind::terminate()) {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
