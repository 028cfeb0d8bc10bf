//! Mocks folder watcher for hot reload.

use super::loader::{is_definition_file, FileLoader};
use crate::mocks::Mocks;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Reloads a [`Mocks`] holder whenever a definition file changes.
///
/// Bursts of file events (editors often write several times per save) are
/// collapsed into one reload after `debounce` of quiet.
pub struct MocksWatcher {
    loader: Arc<FileLoader>,
    mocks: Arc<Mocks>,
    debounce: Duration,
}

impl MocksWatcher {
    pub fn new(loader: Arc<FileLoader>, mocks: Arc<Mocks>, debounce: Duration) -> Self {
        Self {
            loader,
            mocks,
            debounce,
        }
    }

    /// Start watching. Must be called inside a tokio runtime; the returned
    /// watcher stops on drop.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify()
                        || event.kind.is_create()
                        || event.kind.is_remove())
                        && event.paths.iter().any(|p| is_definition_file(p));
                    if relevant {
                        debug!("Mocks file change detected: {:?}", event.paths);
                        let _ = tx.send(());
                    }
                }
                Err(e) => error!("Watch error: {:?}", e),
            },
            Config::default(),
        )?;
        watcher.watch(self.loader.root(), RecursiveMode::Recursive)?;
        info!(path = ?self.loader.root(), "Mocks watcher started");

        let debounce = self.debounce;
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // Wait for the burst to settle
                loop {
                    match tokio::time::timeout(debounce, rx.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }
                info!("Mocks files changed, reloading...");
                if let Err(e) = self.loader.reload_blocking(&self.mocks).await {
                    error!("Failed to reload mocks: {}. Keeping current routes.", e);
                }
            }
        });

        Ok(watcher)
    }
}
