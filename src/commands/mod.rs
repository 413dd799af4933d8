//! Command parsing, routing, and execution.
//!
//! A request frame becomes a [`ParsedCommand`], its verb resolves to a
//! [`CommandId`] that carries the arity contract and persistence flag, and
//! the [`CommandExecutor`] runs the matching handler against the store.

mod connection;
mod dispatch;
mod executor;
mod hashes;
mod strings;

pub use dispatch::{ascii_eq_ignore_case, CommandId};
pub use executor::CommandExecutor;

use crate::error::{CommandError, Result};
use crate::protocol::Frame;
use bytes::Bytes;

/// Parsed command with name and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Command name (uppercase)
    pub name: String,
    /// Command arguments
    pub args: Vec<Bytes>,
}

impl ParsedCommand {
    /// Build a command from a verb and arguments.
    pub fn new(name: impl Into<String>, args: Vec<Bytes>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            args,
        }
    }

    /// Parse a command from a RESP frame.
    ///
    /// The frame must be a non-empty array whose elements are all bulk or
    /// simple strings.
    pub fn from_frame(frame: Frame) -> Result<Self> {
        let frames = match frame {
            Frame::Array(arr) if !arr.is_empty() => arr,
            Frame::Array(_) => return Err(CommandError::InvalidRequest("empty array").into()),
            _ => return Err(CommandError::InvalidRequest("expected array").into()),
        };

        let mut parts = Vec::with_capacity(frames.len());
        for f in frames {
            match f {
                Frame::Bulk(b) => parts.push(b),
                Frame::Simple(s) => parts.push(Bytes::from(s)),
                _ => {
                    return Err(
                        CommandError::InvalidRequest("expected array of strings").into(),
                    )
                }
            }
        }

        let mut iter = parts.into_iter();
        let name_bytes = iter
            .next()
            .ok_or(CommandError::InvalidRequest("empty array"))?;
        // Non-UTF-8 verbs can never match a command; keep them lossy so the
        // caller still sees an unknown command rather than a bad request.
        let name = String::from_utf8_lossy(&name_bytes).to_ascii_uppercase();

        Ok(Self {
            name,
            args: iter.collect(),
        })
    }

    /// Encode back into the request frame written to the append log.
    pub fn to_frame(&self) -> Frame {
        let mut items = Vec::with_capacity(self.args.len() + 1);
        items.push(Frame::Bulk(Bytes::copy_from_slice(self.name.as_bytes())));
        items.extend(self.args.iter().cloned().map(Frame::Bulk));
        Frame::Array(items)
    }

    /// Get the number of arguments (excluding command name).
    #[inline]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Get an argument as bytes.
    #[inline]
    pub fn get_arg(&self, index: usize) -> Option<&Bytes> {
        self.args.get(index)
    }
}
