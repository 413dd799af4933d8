//! Persistence layer.
//!
//! Durability is a single append-only log of write commands in RESP
//! format. The log is replayed into an empty store at startup and synced
//! to disk by a background task on a fixed interval, so at most one
//! interval of acknowledged writes can be lost on a crash.

mod aof;
mod sync;

pub use aof::AppendLog;
pub use sync::SyncTask;

use crate::commands::{CommandExecutor, ParsedCommand};
use crate::error::StorageError;
use tracing::{info, warn};

/// Replay the log into the executor's store.
///
/// Every entry goes through the same lookup, arity check, and handler as a
/// live request. Entries that decode but are not runnable commands are
/// skipped with a warning; entries that do not decode are fatal.
///
/// Returns the number of entries applied.
pub fn load(log: &AppendLog, executor: &CommandExecutor) -> Result<usize, StorageError> {
    let mut applied = 0usize;
    let mut skipped = 0usize;

    let total = log.replay(|frame| {
        let outcome = ParsedCommand::from_frame(frame).and_then(|cmd| executor.execute(&cmd));
        match outcome {
            Ok(_) => applied += 1,
            Err(e) => {
                skipped += 1;
                warn!("Skipping append log entry: {}", e);
            }
        }
    })?;

    info!(
        "Append log loaded: {} entries applied, {} skipped, {} bytes",
        applied,
        skipped,
        log.total_bytes()
    );
    debug_assert_eq!(applied + skipped, total);
    Ok(applied)
}
