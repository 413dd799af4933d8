//! Command executor - the main entry point for command processing.

use super::dispatch::CommandId;
use super::{connection, hashes, strings, ParsedCommand};
use crate::error::{CommandError, Result};
use crate::protocol::Frame;
use crate::storage::Store;
use std::sync::Arc;
use tracing::trace;

/// Routes parsed commands to their handlers.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    store: Arc<Store>,
}

impl CommandExecutor {
    /// Create a new command executor over a store.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// The store commands run against.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Look up, validate, and run a command.
    ///
    /// Unknown verbs and arity violations come back as errors; the store is
    /// untouched in both cases.
    pub fn execute(&self, cmd: &ParsedCommand) -> Result<Frame> {
        let id = CommandId::lookup(cmd.name.as_bytes())
            .ok_or_else(|| CommandError::UnknownCommand(cmd.name.clone()))?;
        id.check_arity(cmd.arg_count())?;
        Ok(self.dispatch(id, cmd))
    }

    /// Run a command whose arity has already been checked.
    ///
    /// Handlers index their arguments directly, so callers outside the
    /// crate go through [`CommandExecutor::execute`].
    pub(crate) fn dispatch(&self, id: CommandId, cmd: &ParsedCommand) -> Frame {
        trace!(
            "Executing command: {} with {} args",
            id.name(),
            cmd.arg_count()
        );

        let store = &*self.store;
        match id {
            CommandId::Ping => connection::cmd_ping(cmd, store),
            CommandId::Set => strings::cmd_set(cmd, store),
            CommandId::Get => strings::cmd_get(cmd, store),
            CommandId::Del => strings::cmd_del(cmd, store),
            CommandId::Hset => hashes::cmd_hset(cmd, store),
            CommandId::Hget => hashes::cmd_hget(cmd, store),
            CommandId::Hgetall => hashes::cmd_hgetall(cmd, store),
        }
    }
}
