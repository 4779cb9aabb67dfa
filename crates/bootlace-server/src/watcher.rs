//! Hot-reload coordinator
//!
//! Watches the mappings file and the data subdirectories, and reacts to
//! write events: a mappings change triggers a recompile, a data change
//! triggers a template re-parse. Both publish atomically through
//! [`App`]; a failed reload keeps the previous snapshot, so a bad edit
//! never blanks out a working configuration.
//!
//! The underlying notification mechanism is not recursive. Every nested
//! subdirectory of a watched root is subscribed at startup, and newly
//! created directories are subscribed as their create events arrive.

use crate::app::App;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Data subdirectories recognized by event classification
pub const DATA_SUBDIRS: [&str; 6] = [
    "cloud-config",
    "env_overrides",
    "ipxe",
    "kickstart",
    "preseed",
    "static",
];

/// The subset of [`DATA_SUBDIRS`] that is subscribed for notifications.
/// Static assets are served as-is and are not watched.
pub const WATCHED_SUBDIRS: [&str; 5] = [
    "cloud-config",
    "env_overrides",
    "ipxe",
    "kickstart",
    "preseed",
];

/// Error type for watch setup and runtime failures
#[derive(Debug, Error)]
pub enum WatchError {
    /// The watcher itself could not be created
    #[error("failed to create filesystem watcher: {0}")]
    Init(#[source] notify::Error),

    /// A required path could not be subscribed at startup
    #[error("failed to watch {path}: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The notification source reported an error after startup
    #[error("filesystem watcher failed: {0}")]
    Runtime(#[source] notify::Error),

    /// The notification channel closed unexpectedly
    #[error("filesystem watcher channel closed")]
    Closed,
}

/// What a single filesystem event asks the coordinator to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    ReloadMappings,
    ReloadTemplates,
    Ignore,
}

/// Classify a changed path against the mappings file and the recognized
/// data subdirectories.
pub fn classify(path: &Path, mappings_path: &Path, data_dir: &Path) -> WatchAction {
    if path == mappings_path {
        return WatchAction::ReloadMappings;
    }
    for dir in DATA_SUBDIRS {
        if path.starts_with(data_dir.join(dir)) {
            return WatchAction::ReloadTemplates;
        }
    }
    WatchAction::Ignore
}

/// Subscribe the mappings file and every data subdirectory, then spawn
/// the event loop.
///
/// Subscription of any required path failing is fatal: there is no
/// partial-watch mode, because a silently unwatched directory would
/// make configuration edits invisible. Runtime watcher failures are
/// forwarded over `fatal_tx` and the loop stops; the composition root
/// decides what to do about it.
pub fn spawn(
    app: Arc<App>,
    mut shutdown: watch::Receiver<()>,
    fatal_tx: mpsc::Sender<WatchError>,
) -> Result<JoinHandle<()>, WatchError> {
    // Canonicalize so event paths from the notification backend compare
    // equal to the configured ones.
    let data_dir = canonical(&app.config().data_dir);
    let mappings_path = canonical(&app.config().mappings_path());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })
    .map_err(WatchError::Init)?;

    subscribe(&mut watcher, &mappings_path)?;
    for dir in WATCHED_SUBDIRS {
        let root = data_dir.join(dir);
        subscribe(&mut watcher, &root)?;
        // Notifications do not propagate into nested directories;
        // subscribe each one individually.
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_dir() {
                subscribe(&mut watcher, entry.path())?;
            }
        }
    }
    info!(data_dir = %data_dir.display(), "watching for configuration changes");

    let task = tokio::spawn(async move {
        // The watcher moves into the task so subscriptions stay alive
        // and create events can add new directories.
        let mut watcher = watcher;
        loop {
            tokio::select! {
                event = rx.recv() => {
                    match event {
                        Some(Ok(event)) => {
                            handle_event(&app, &mut watcher, &event, &mappings_path, &data_dir);
                        }
                        Some(Err(e)) => {
                            // A dead watcher means edits silently stop
                            // propagating; surface it and stop.
                            error!(error = %e, "filesystem watcher error");
                            let _ = fatal_tx.send(WatchError::Runtime(e)).await;
                            break;
                        }
                        None => {
                            let _ = fatal_tx.send(WatchError::Closed).await;
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    debug!("watcher shutting down");
                    break;
                }
            }
        }
    });

    Ok(task)
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn subscribe(watcher: &mut RecommendedWatcher, path: &Path) -> Result<(), WatchError> {
    watcher
        .watch(path, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Subscribe {
            path: path.to_path_buf(),
            source,
        })
}

fn handle_event(
    app: &App,
    watcher: &mut RecommendedWatcher,
    event: &Event,
    mappings_path: &Path,
    data_dir: &Path,
) {
    for path in &event.paths {
        debug!(path = %path.display(), kind = ?event.kind, "file changed");
    }

    // A directory created under a watched root must be subscribed right
    // away or changes inside it are silently missed.
    if matches!(event.kind, EventKind::Create(_)) {
        for path in &event.paths {
            if path.is_dir()
                && classify(path, mappings_path, data_dir) == WatchAction::ReloadTemplates
            {
                match watcher.watch(path, RecursiveMode::NonRecursive) {
                    Ok(()) => debug!(path = %path.display(), "watching new directory"),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to watch new directory")
                    }
                }
            }
        }
    }

    // Only write events drive a reload; renames, metadata changes and
    // removals are ignored.
    if !matches!(
        event.kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    ) {
        return;
    }

    for path in &event.paths {
        match classify(path, mappings_path, data_dir) {
            WatchAction::ReloadMappings => {
                info!("mappings file changed, recompiling");
                if let Err(e) = app.reload_mappings() {
                    // Keep serving the previous set; a bad edit must not
                    // take down in-flight provisioning.
                    error!(error = %e, "mappings reload failed, keeping previous bindings");
                }
            }
            WatchAction::ReloadTemplates => {
                info!(path = %path.display(), "data directory changed, rebuilding templates");
                if let Err(e) = app.reload_templates() {
                    error!(error = %e, "template reload failed, keeping previous templates");
                }
            }
            WatchAction::Ignore => {
                info!(path = %path.display(), "unrecognized change, ignoring");
            }
        }
    }
}
