//! Server implementation.
//!
//! This module provides the async TCP server, connection handling,
//! and configuration.

pub mod config;
mod connection;

pub use config::{Config, ConfigError, LogLevel};
pub use connection::Connection;

use crate::commands::CommandExecutor;
use crate::persistence::{self, AppendLog, SyncTask};
use crate::storage::Store;
use crate::Result;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// The key-value server.
///
/// Startup is strictly ordered: [`Server::open`] loads the append log
/// into the store before [`Server::bind`] opens the listener, so no client
/// ever observes a partially replayed store.
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: Config,
    /// In-memory tables
    store: Arc<Store>,
    /// Command executor
    executor: Arc<CommandExecutor>,
    /// Append log (None when persistence is off)
    log: Option<Arc<AppendLog>>,
    /// Shutdown notification
    shutdown: Arc<Notify>,
    /// Total connections, used as connection ids
    total_connections: AtomicU64,
}

impl Server {
    /// Build the store, open the append log and replay it.
    pub fn open(config: Config) -> Result<Self> {
        let store = Arc::new(Store::new());
        let executor = Arc::new(CommandExecutor::new(store.clone()));

        let log = if config.appendonly {
            let path = config.aof_path();
            let load_start = Instant::now();
            let log = AppendLog::open(&path)?;
            let applied = persistence::load(&log, &executor)?;
            info!(
                "DB loaded from append log {}: {} commands in {:.3} seconds",
                path.display(),
                applied,
                load_start.elapsed().as_secs_f64()
            );
            Some(Arc::new(log))
        } else {
            info!("Append log disabled; data will not survive a restart");
            None
        };

        Ok(Self {
            config,
            store,
            executor,
            log,
            shutdown: Arc::new(Notify::new()),
            total_connections: AtomicU64::new(0),
        })
    }

    /// Bind the listener on the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let ip: IpAddr = self.config.bind.parse()?;
        let addr = SocketAddr::new(ip, self.config.port);
        let listener = TcpListener::bind(addr).await?;
        Ok(listener)
    }

    /// Bind and serve until shutdown.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Accept connections on `listener` until [`Server::shutdown`] is called.
    ///
    /// Each connection runs in its own task. On shutdown the open
    /// connections are told to close and are waited for before the append
    /// log sync task takes its final sync, so every acknowledged write is
    /// on disk when this returns.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        match listener.local_addr() {
            Ok(addr) => info!("Ready to accept connections tcp on {}", addr),
            Err(_) => info!("Ready to accept connections tcp"),
        }

        let sync_task = self
            .log
            .clone()
            .map(|log| SyncTask::spawn(log, self.config.sync_interval));

        let (close_tx, _) = broadcast::channel::<()>(1);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((socket, peer_addr)) => {
                            if let Err(e) = socket.set_nodelay(true) {
                                warn!("Failed to set TCP_NODELAY: {}", e);
                            }

                            let conn_id = self.total_connections.fetch_add(1, Ordering::Relaxed) + 1;
                            let mut connection = Connection::new(
                                socket,
                                peer_addr,
                                conn_id,
                                self.executor.clone(),
                                self.log.clone(),
                                close_tx.subscribe(),
                            );

                            connections.spawn(async move {
                                if let Err(e) = connection.run().await {
                                    error!("Connection error from {}: {}", peer_addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        error!("Connection task ended abnormally: {}", e);
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(listener);
        if !connections.is_empty() {
            info!("Closing {} open connections", connections.len());
        }
        close_tx.send(()).ok();
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                error!("Connection task ended abnormally: {}", e);
            }
        }

        if let Some(task) = sync_task {
            if let Err(e) = task.stop().await {
                error!("Final append log sync failed: {}", e);
            }
        }

        info!("sack is now ready to exit, bye bye...");

        Ok(())
    }

    /// Signal the server to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Get the total connections accepted since startup.
    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Get the store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}
