//! String command implementations.

use super::ParsedCommand;
use crate::protocol::Frame;
use crate::storage::Store;

/// SET key value
pub fn cmd_set(cmd: &ParsedCommand, store: &Store) -> Frame {
    store.set(cmd.args[0].clone(), cmd.args[1].clone());
    Frame::ok()
}

/// GET key
pub fn cmd_get(cmd: &ParsedCommand, store: &Store) -> Frame {
    match store.get(&cmd.args[0]) {
        Some(value) => Frame::Bulk(value),
        None => Frame::Null,
    }
}

/// DEL key
///
/// Replies OK whether or not the key existed. Only the string table is
/// touched.
pub fn cmd_del(cmd: &ParsedCommand, store: &Store) -> Frame {
    store.delete(&cmd.args[0]);
    Frame::ok()
}
