//! File watcher for re-running draw scripts on save

use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, Debouncer, new_debouncer};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;
use thiserror::Error;

/// Default debounce window
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Errors raised while setting up file watching
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to create file watcher: {0}")]
    Create(notify::Error),

    #[error("Failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Event emitted for a watched script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptChange {
    /// The script was written (debounced)
    Modified(PathBuf),
    /// The underlying watcher reported an error
    Error(String),
}

/// Watches script files and reports debounced modifications
pub struct ScriptWatcher {
    debouncer: Debouncer<notify::RecommendedWatcher>,
    receiver: Receiver<ScriptChange>,
    watched: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptWatcher {
    /// Create a watcher; `debounce_ms` defaults to [`DEFAULT_DEBOUNCE_MS`]
    pub fn new(debounce_ms: Option<u64>) -> Result<Self, WatchError> {
        let (tx, rx) = channel();
        let watched: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));
        let filter = Arc::clone(&watched);

        let debounce = Duration::from_millis(debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS));
        let debouncer = new_debouncer(
            debounce,
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    let watched = filter.lock();
                    for event in events {
                        if watched.contains(&event.path) {
                            let _ = tx.send(ScriptChange::Modified(event.path));
                        }
                    }
                }
                Err(err) => {
                    let _ = tx.send(ScriptChange::Error(err.to_string()));
                }
            },
        )
        .map_err(WatchError::Create)?;

        Ok(Self {
            debouncer,
            receiver: rx,
            watched,
        })
    }

    /// Start watching a script file
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<(), WatchError> {
        let path = path.as_ref();
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        self.debouncer
            .watcher()
            .watch(&canonical, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Watch {
                path: canonical.clone(),
                source,
            })?;

        let mut watched = self.watched.lock();
        if !watched.contains(&canonical) {
            watched.push(canonical.clone());
        }

        tracing::info!(path = %canonical.display(), "watching script");
        Ok(())
    }

    /// Paths currently watched
    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched.lock().clone()
    }

    /// Try to receive a change (non-blocking)
    pub fn try_recv(&self) -> Option<ScriptChange> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for a change
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ScriptChange> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Get all pending changes
    pub fn drain(&self) -> Vec<ScriptChange> {
        self.receiver.try_iter().collect()
    }
}
