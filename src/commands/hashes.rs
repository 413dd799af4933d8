//! Hash command implementations.

use super::ParsedCommand;
use crate::protocol::Frame;
use crate::storage::Store;

/// HSET key field value
///
/// Creates the hash on first write.
pub fn cmd_hset(cmd: &ParsedCommand, store: &Store) -> Frame {
    store.hset(
        cmd.args[0].clone(),
        cmd.args[1].clone(),
        cmd.args[2].clone(),
    );
    Frame::ok()
}

/// HGET key field
pub fn cmd_hget(cmd: &ParsedCommand, store: &Store) -> Frame {
    match store.hget(&cmd.args[0], &cmd.args[1]) {
        Some(value) => Frame::Bulk(value),
        None => Frame::Null,
    }
}

/// HGETALL key
///
/// Flattened `field, value, field, value, ...` in no particular order.
/// A missing hash is a null bulk, not an empty array.
pub fn cmd_hgetall(cmd: &ParsedCommand, store: &Store) -> Frame {
    let Some(pairs) = store.hgetall(&cmd.args[0]) else {
        return Frame::Null;
    };

    let mut items = Vec::with_capacity(pairs.len() * 2);
    for (field, value) in pairs {
        items.push(Frame::Bulk(field));
        items.push(Frame::Bulk(value));
    }
    Frame::Array(items)
}
