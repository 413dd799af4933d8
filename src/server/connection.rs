//! Connection handling for individual clients.

use crate::commands::{CommandExecutor, CommandId, ParsedCommand};
use crate::error::Error;
use crate::persistence::AppendLog;
use crate::protocol::{Frame, RespParser};
use crate::Result;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Buffer size for reading from socket.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Maximum number of responses to batch before flushing.
const WRITE_BATCH_SIZE: usize = 64;

/// Maximum bytes to buffer before forcing a flush.
const WRITE_BUFFER_HIGH_WATER: usize = 64 * 1024;

/// A connection to a single client.
pub struct Connection {
    /// TCP stream
    stream: BufWriter<TcpStream>,
    /// Peer address
    peer_addr: SocketAddr,
    /// Connection id, for logs
    id: u64,
    /// RESP parser
    parser: RespParser,
    /// Command executor
    executor: Arc<CommandExecutor>,
    /// Append log, when persistence is enabled
    log: Option<Arc<AppendLog>>,
    /// Fires when the server shuts down
    close: broadcast::Receiver<()>,
    /// Write buffer
    write_buffer: BytesMut,
    /// Number of pending writes (for batching)
    pending_writes: usize,
}

impl Connection {
    /// Create a new connection.
    pub fn new(
        stream: TcpStream,
        peer_addr: SocketAddr,
        id: u64,
        executor: Arc<CommandExecutor>,
        log: Option<Arc<AppendLog>>,
        close: broadcast::Receiver<()>,
    ) -> Self {
        debug!("New connection from {} (id={})", peer_addr, id);

        Self {
            stream: BufWriter::new(stream),
            peer_addr,
            id,
            parser: RespParser::new(),
            executor,
            log,
            close,
            write_buffer: BytesMut::with_capacity(4096),
            pending_writes: 0,
        }
    }

    /// Run the connection handler until the peer disconnects.
    ///
    /// Returns an error for a malformed or truncated request stream and for
    /// a failed append log write; either way only this connection ends.
    /// A server shutdown ends the connection between reads, after every
    /// request already received has been answered.
    pub async fn run(&mut self) -> Result<()> {
        let mut read_buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let n = tokio::select! {
                result = self.stream.get_mut().read(&mut read_buf) => result?,
                _ = self.close.recv() => {
                    debug!("Closing connection {} (id={}) for shutdown", self.peer_addr, self.id);
                    break;
                }
            };
            if n == 0 {
                // A peer that hangs up mid-request sent a truncated frame.
                self.parser.finish()?;
                debug!("Connection closed by peer: {} (id={})", self.peer_addr, self.id);
                break;
            }

            trace!("Read {} bytes from {}", n, self.peer_addr);
            self.parser.extend(&read_buf[..n]);

            // Process all complete frames with write batching
            loop {
                match self.parser.parse() {
                    Ok(Some(frame)) => {
                        self.handle_frame(frame)?;

                        if self.pending_writes >= WRITE_BATCH_SIZE
                            || self.write_buffer.len() >= WRITE_BUFFER_HIGH_WATER
                        {
                            self.flush_writes().await?;
                        }
                    }
                    Ok(None) => {
                        if self.pending_writes > 0 {
                            self.flush_writes().await?;
                        }
                        break;
                    }
                    Err(e) => {
                        // The stream cannot be resynchronized; answer once and hang up.
                        let err = Error::Protocol(e);
                        self.queue_frame(&Frame::error(err.to_reply()));
                        if let Err(flush_err) = self.flush_writes().await {
                            trace!("Could not deliver protocol error to {}: {}", self.peer_addr, flush_err);
                        }
                        return Err(err);
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle a complete request frame.
    fn handle_frame(&mut self, frame: Frame) -> Result<()> {
        trace!("Handling frame: {:?}", frame);

        let cmd = match ParsedCommand::from_frame(frame) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("Invalid request from {}: {}", self.peer_addr, e);
                self.queue_frame(&Frame::error(e.to_reply()));
                return Ok(());
            }
        };

        let Some(id) = CommandId::lookup(cmd.name.as_bytes()) else {
            debug!("Unknown command '{}' from {}", cmd.name, self.peer_addr);
            self.queue_frame(&Frame::simple(""));
            return Ok(());
        };

        if let Err(e) = id.check_arity(cmd.arg_count()) {
            self.queue_frame(&Frame::error(e.to_string()));
            return Ok(());
        }

        // The log entry is written before the store changes.
        if id.is_write() {
            if let Some(log) = &self.log {
                log.append(&cmd.to_frame())?;
            }
        }

        let response = self.executor.dispatch(id, &cmd);
        self.queue_frame(&response);

        Ok(())
    }

    /// Queue a frame for writing (batched).
    fn queue_frame(&mut self, frame: &Frame) {
        frame.serialize(&mut self.write_buffer);
        self.pending_writes += 1;
    }

    /// Flush all pending writes to the socket.
    async fn flush_writes(&mut self) -> Result<()> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }

        self.stream.write_all(&self.write_buffer).await?;
        self.stream.flush().await?;
        self.write_buffer.clear();
        self.pending_writes = 0;

        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer_addr", &self.peer_addr)
            .field("id", &self.id)
            .field("persistent", &self.log.is_some())
            .finish()
    }
}
