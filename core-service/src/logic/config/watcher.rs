//! Config Watcher - hot reload on file change
//!
//! Watches the config file's directory (editors often replace the file
//! rather than write it in place) and reloads on any change to the file.
//! Reloads run on a worker thread with bounded retries, so a file read
//! half-written is picked up once the writer finishes.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use log::{debug, error, info};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::store::ConfigStore;
use crate::logic::error::{ConfigError, EngineError};
use crate::logic::forensics::RetryPolicy;

/// Retries after a failed hot reload (about 3 s in total)
pub const RELOAD_RETRY: RetryPolicy = RetryPolicy {
    max_retries: 5,
    initial_backoff_ms: 100,
    max_backoff_ms: 1_600,
};

/// Stops watching when dropped
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl ConfigWatcher {
    pub fn spawn(store: Arc<ConfigStore>) -> Result<Self, EngineError> {
        let path = store.source().ok_or(ConfigError::NoSource)?.to_path_buf();
        let file_name = path.file_name().map(|n| n.to_os_string()).ok_or(ConfigError::NoSource)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (changed_tx, changed_rx) = mpsc::channel::<()>();
        thread::Builder::new()
            .name("config-reload".to_string())
            .spawn(move || run_reloader(store, changed_rx))?;

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    error!("Config watch error: {}", e);
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            if !event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str())) {
                return;
            }

            debug!("Config file changed: {:?}", event.kind);
            let _ = changed_tx.send(());
        })?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!("Watching {:?} for config changes", path);

        Ok(Self { _watcher: watcher, path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Exits once the watcher (and with it the sender) is dropped
fn run_reloader(store: Arc<ConfigStore>, changed: mpsc::Receiver<()>) {
    while changed.recv().is_ok() {
        // One reload covers a burst of events.
        while changed.try_recv().is_ok() {}

        // Failures are logged by the store; the prior config stays active.
        if let Ok(generation) = store.reload_with_backoff(&RELOAD_RETRY, thread::sleep) {
            info!("Hot-reloaded config (generation {})", generation);
        }
    }
    debug!("Config reloader stopped");
}
