//! Background sync of the append log.

use super::AppendLog;
use crate::error::StorageError;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, trace};

/// Periodically flushes the append log to disk.
///
/// Owned by the server; [`SyncTask::stop`] ends the loop and performs one
/// last sync so nothing appended before shutdown is left unflushed.
#[derive(Debug)]
pub struct SyncTask {
    log: Arc<AppendLog>,
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl SyncTask {
    /// Start syncing `log` every `every`.
    pub fn spawn(log: Arc<AppendLog>, every: Duration) -> Self {
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(run(log.clone(), every, shutdown.clone()));
        Self {
            log,
            shutdown,
            handle,
        }
    }

    /// Stop the task and sync one final time.
    pub async fn stop(self) -> Result<(), StorageError> {
        self.shutdown.notify_one();
        if let Err(e) = self.handle.await {
            error!("Append log sync task ended abnormally: {}", e);
        }

        let log = self.log;
        tokio::task::spawn_blocking(move || log.sync())
            .await
            .map_err(|e| {
                StorageError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    format!("spawn_blocking panicked: {e}"),
                ))
            })?
    }
}

async fn run(log: Arc<AppendLog>, every: Duration, shutdown: Arc<Notify>) {
    info!("Append log sync task started (every {:?})", every);

    let mut interval = time::interval(every.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => sync_once(&log).await,
            _ = shutdown.notified() => break,
        }
    }

    info!("Append log sync task stopped");
}

async fn sync_once(log: &Arc<AppendLog>) {
    if !log.is_dirty() {
        return;
    }

    let log = log.clone();
    match tokio::task::spawn_blocking(move || log.sync()).await {
        Ok(Ok(())) => trace!("Append log synced"),
        Ok(Err(e)) => error!("Append log sync failed: {}", e),
        Err(e) => error!("Append log sync panicked: {}", e),
    }
}
