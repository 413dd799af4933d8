//! Connection command implementations.

use super::ParsedCommand;
use crate::protocol::Frame;
use crate::storage::Store;

/// PING [message]
///
/// The message comes back as a simple string. Messages that cannot be
/// carried by a simple string (CR, LF, or non-UTF-8) come back as a bulk.
pub fn cmd_ping(cmd: &ParsedCommand, _store: &Store) -> Frame {
    let Some(message) = cmd.get_arg(0) else {
        return Frame::pong();
    };

    match std::str::from_utf8(message) {
        Ok(text) if !text.contains(['\r', '\n']) => Frame::simple(text),
        _ => Frame::Bulk(message.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_ping() {
        let store = Store::new();
        let cmd = ParsedCommand::new("PING", vec![]);
        assert_eq!(cmd_ping(&cmd, &store), Frame::pong());
    }

    #[test]
    fn test_ping_echo() {
        let store = Store::new();
        let cmd = ParsedCommand::new("PING", vec![Bytes::from("hello")]);
        assert_eq!(cmd_ping(&cmd, &store), Frame::simple("hello"));
        assert_eq!(cmd_ping(&cmd, &store).to_vec(), b"+hello\r\n");
    }

    #[test]
    fn test_ping_echo_with_newline_uses_bulk() {
        let store = Store::new();
        let cmd = ParsedCommand::new("PING", vec![Bytes::from("a\r\nb")]);
        assert_eq!(cmd_ping(&cmd, &store), Frame::bulk("a\r\nb"));
    }
}
