//! File change notifications.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::Result;

/// A set of watched files.
pub trait FileWatcher: Send {
    fn watch(&mut self, path: &Path) -> Result<()>;
    fn unwatch(&mut self, path: &Path) -> Result<()>;
}

/// [`FileWatcher`] backed by the platform's `notify` watcher.
///
/// Paths of modified and created files are sent to the channel given to
/// [`NotifyWatcher::new`], one message per path.
pub struct NotifyWatcher {
    inner: RecommendedWatcher,
}

impl NotifyWatcher {
    pub fn new(sender: mpsc::UnboundedSender<PathBuf>) -> Result<Self> {
        let inner = notify::recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) => {
                for path in event.paths {
                    if sender.send(path).is_err() {
                        break; // Receiver dropped
                    }
                }
            }
            Ok(_) => {}
            Err(e) => warn!("File watch error: {}", e),
        })?;

        Ok(Self { inner })
    }
}

impl FileWatcher for NotifyWatcher {
    fn watch(&mut self, path: &Path) -> Result<()> {
        debug!("watching {}", path.display());
        self.inner.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        debug!("unwatching {}", path.display());
        self.inner.unwatch(path)?;
        Ok(())
    }
}
