//! Append-only command log.
//!
//! Write commands are stored as RESP arrays, one per entry, in the order
//! they were appended. The file is only ever appended to; there is no
//! rewrite or compaction.

use crate::error::StorageError;
use crate::protocol::{Frame, RespParser};
use bytes::BytesMut;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// Read size used when replaying the log.
const REPLAY_CHUNK_SIZE: usize = 64 * 1024;

/// The append-only log file.
///
/// Appends are serialized by one log-wide lock so entries never
/// interleave. Appends hand bytes to the OS and return; durability comes
/// from [`AppendLog::sync`].
#[derive(Debug)]
pub struct AppendLog {
    path: PathBuf,
    file: Mutex<File>,
    /// Second handle on the same file so a sync does not hold up appends.
    sync_handle: File,
    dirty: AtomicBool,
    total_bytes: AtomicU64,
}

impl AppendLog {
    /// Open the log at `path`, creating it (and its parent directory) if
    /// needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let sync_handle = file.try_clone()?;
        let len = file.metadata()?.len();

        debug!("Opened append log {} ({} bytes)", path.display(), len);

        Ok(Self {
            path,
            file: Mutex::new(file),
            sync_handle,
            dirty: AtomicBool::new(false),
            total_bytes: AtomicU64::new(len),
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the log in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    /// Append one command frame.
    pub fn append(&self, frame: &Frame) -> Result<(), StorageError> {
        let mut buf = BytesMut::with_capacity(frame.serialized_size());
        frame.serialize(&mut buf);
        self.append_raw(&buf)
    }

    /// Append already-encoded RESP bytes.
    pub fn append_raw(&self, bytes: &[u8]) -> Result<(), StorageError> {
        {
            let mut file = self.file.lock();
            file.write_all(bytes)?;
        }
        self.total_bytes
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Flush appended data to stable storage.
    ///
    /// Does nothing if nothing was appended since the last successful sync.
    pub fn sync(&self) -> Result<(), StorageError> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = self.sync_handle.sync_data() {
            self.dirty.store(true, Ordering::Release);
            return Err(e.into());
        }
        Ok(())
    }

    /// Returns true if there are appends not yet synced.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Decode every entry from the start of the file, in order.
    ///
    /// The file is streamed through the parser in fixed-size chunks, so
    /// memory use does not grow with the log. `apply` is called once per
    /// decoded frame. The log must end exactly on an entry boundary; a torn
    /// or malformed entry is reported as [`StorageError::Corrupted`] with
    /// its byte offset and nothing after it is applied.
    ///
    /// Returns the number of frames decoded.
    pub fn replay<F>(&self, mut apply: F) -> Result<usize, StorageError>
    where
        F: FnMut(Frame),
    {
        let mut file = File::open(&self.path)?;
        let mut parser = RespParser::with_capacity(REPLAY_CHUNK_SIZE);
        let mut chunk = vec![0u8; REPLAY_CHUNK_SIZE];

        // Bytes handed to the parser, and where the next entry starts.
        let mut fed = 0usize;
        let mut entry_start = 0usize;
        let mut count = 0usize;

        loop {
            let n = match file.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                parser.finish().map_err(|source| StorageError::Corrupted {
                    offset: entry_start,
                    source,
                })?;
                break;
            }

            parser.extend(&chunk[..n]);
            fed += n;

            loop {
                match parser.parse() {
                    Ok(Some(frame)) => {
                        apply(frame);
                        count += 1;
                        entry_start = fed - parser.len();
                    }
                    Ok(None) => break,
                    Err(source) => {
                        return Err(StorageError::Corrupted {
                            offset: entry_start,
                            source,
                        })
                    }
                }
            }
        }

        debug!("Replayed {} entries from {}", count, self.path.display());
        Ok(count)
    }
}
