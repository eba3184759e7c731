//! Directory watcher that turns manifest changes into bundle events.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval};

use crate::config::SourceConfig;
use crate::lifecycle::ShutdownSignal;
use crate::source::{BundleEvent, Snapshot, SourceError};

/// Watches a directory of bundle manifests.
#[derive(Debug)]
pub struct BundleWatcher {
    dir: PathBuf,
    resync: Option<Duration>,
    namespace: Option<String>,
    events: mpsc::UnboundedSender<BundleEvent>,
    snapshot: Snapshot,
}

impl BundleWatcher {
    /// Create a watcher for the configured directory.
    ///
    /// Returns the watcher and a receiver for bundle events.
    pub fn new(config: &SourceConfig) -> (Self, mpsc::UnboundedReceiver<BundleEvent>) {
        let resync = (config.resync_secs > 0).then(|| Duration::from_secs(config.resync_secs));
        Self::with_dir(&config.bundles_dir, resync, config.namespace())
    }

    pub fn with_dir(
        dir: &Path,
        resync: Option<Duration>,
        namespace: Option<&str>,
    ) -> (Self, mpsc::UnboundedReceiver<BundleEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                dir: dir.to_path_buf(),
                resync,
                namespace: namespace.map(str::to_string),
                events,
                snapshot: Snapshot::default(),
            },
            rx,
        )
    }

    /// Re-read the directory and emit the difference to the last scan.
    pub fn rescan(&mut self) -> Result<usize, SourceError> {
        let next = Snapshot::scan(&self.dir, &self.snapshot)?
            .in_namespace(self.namespace.as_deref());
        let events = self.snapshot.diff(&next);
        self.snapshot = next;
        Ok(self.emit(events))
    }

    /// Emit `Update(b, b)` for every known bundle.
    pub fn resync(&self) -> usize {
        tracing::debug!(bundles = self.snapshot.len(), "Resyncing bundles");
        self.emit(self.snapshot.resync_events())
    }

    fn emit(&self, events: Vec<BundleEvent>) -> usize {
        let mut sent = 0;
        for event in events {
            if self.events.send(event).is_err() {
                break;
            }
            sent += 1;
        }
        sent
    }

    /// Start the OS watcher; every filesystem event becomes a tick.
    fn watch(&self) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<()>), SourceError> {
        fs::create_dir_all(&self.dir).map_err(|source| SourceError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove() {
                        let _ = tick_tx.send(());
                    }
                }
                Err(e) => tracing::error!(error = %e, "Bundle watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.dir.display(), "Bundle watcher started");
        Ok((watcher, tick_rx))
    }

    /// Emit the initial bundles, then follow the directory until shutdown.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> Result<(), SourceError> {
        let (_watcher, mut ticks) = self.watch()?;
        self.rescan()?;

        let mut resync = self.resync.map(|period| interval_at(Instant::now() + period, period));
        loop {
            tokio::select! {
                tick = ticks.recv() => {
                    if tick.is_none() {
                        break;
                    }
                    // coalesce bursts from a single write
                    while ticks.try_recv().is_ok() {}
                    if let Err(e) = self.rescan() {
                        tracing::error!(error = %e, "Failed to rescan bundles");
                    }
                }
                _ = next_resync(&mut resync) => {
                    self.resync();
                }
                _ = shutdown.triggered() => break,
            }
            if self.events.is_closed() {
                break;
            }
        }

        tracing::info!(shutdown = shutdown.is_triggered(), "Bundle watcher stopped");
        Ok(())
    }
}

async fn next_resync(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
