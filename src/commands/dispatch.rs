//! Command lookup.
//!
//! The command table is a closed enum. Each variant knows its wire name,
//! how many arguments it takes, and whether it must be written to the
//! append log before it runs.

use crate::error::CommandError;

/// Fast case-insensitive ASCII comparison.
/// Returns true if `a` equals `b` ignoring ASCII case.
#[inline]
pub fn ascii_eq_ignore_case(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| x.eq_ignore_ascii_case(y))
}

/// Command identifier for match-based dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    // Connection commands
    Ping,

    // String commands
    Set,
    Get,
    Del,

    // Hash commands
    Hset,
    Hget,
    Hgetall,
}

impl CommandId {
    /// Every command the server knows.
    pub const ALL: [CommandId; 7] = [
        CommandId::Ping,
        CommandId::Set,
        CommandId::Get,
        CommandId::Del,
        CommandId::Hset,
        CommandId::Hget,
        CommandId::Hgetall,
    ];

    /// Look up a command by name, ignoring ASCII case.
    #[inline]
    pub fn lookup(name: &[u8]) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| ascii_eq_ignore_case(id.name().as_bytes(), name))
    }

    /// Uppercase wire name.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            CommandId::Ping => "PING",
            CommandId::Set => "SET",
            CommandId::Get => "GET",
            CommandId::Del => "DEL",
            CommandId::Hset => "HSET",
            CommandId::Hget => "HGET",
            CommandId::Hgetall => "HGETALL",
        }
    }

    /// Accepted argument counts as `(min, max)`, verb excluded.
    #[inline]
    pub const fn arity(self) -> (usize, usize) {
        match self {
            CommandId::Ping => (0, 1),
            CommandId::Set => (2, 2),
            CommandId::Get => (1, 1),
            CommandId::Del => (1, 1),
            CommandId::Hset => (3, 3),
            CommandId::Hget => (2, 2),
            CommandId::Hgetall => (1, 1),
        }
    }

    /// Commands appended to the log before they run.
    ///
    /// DEL is left out: deletes are not persisted and a replayed log
    /// resurrects deleted keys.
    #[inline]
    pub const fn is_write(self) -> bool {
        matches!(self, CommandId::Set | CommandId::Hset)
    }

    /// Validate an argument count against this command's arity.
    pub fn check_arity(self, argc: usize) -> Result<(), CommandError> {
        let (min, max) = self.arity();
        if argc < min || argc > max {
            return Err(CommandError::WrongArity {
                command: self.name().to_ascii_lowercase(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_common_commands() {
        assert_eq!(CommandId::lookup(b"GET"), Some(CommandId::Get));
        assert_eq!(CommandId::lookup(b"get"), Some(CommandId::Get));
        assert_eq!(CommandId::lookup(b"Get"), Some(CommandId::Get));
        assert_eq!(CommandId::lookup(b"set"), Some(CommandId::Set));
        assert_eq!(CommandId::lookup(b"ping"), Some(CommandId::Ping));
        assert_eq!(CommandId::lookup(b"DEL"), Some(CommandId::Del));
        assert_eq!(CommandId::lookup(b"hSeT"), Some(CommandId::Hset));
        assert_eq!(CommandId::lookup(b"HGETALL"), Some(CommandId::Hgetall));
    }

    #[test]
    fn test_lookup_unknown() {
        assert_eq!(CommandId::lookup(b"NOTACOMMAND"), None);
        assert_eq!(CommandId::lookup(b"LPUSH"), None);
        assert_eq!(CommandId::lookup(b""), None);
        assert_eq!(CommandId::lookup(b"GETS"), None);
    }

    #[test]
    fn test_name_roundtrips_through_lookup() {
        for id in CommandId::ALL {
            assert_eq!(CommandId::lookup(id.name().as_bytes()), Some(id));
        }
    }

    #[test]
    fn test_only_set_and_hset_are_logged() {
        let logged: Vec<_> = CommandId::ALL.into_iter().filter(|id| id.is_write()).collect();
        assert_eq!(logged, vec![CommandId::Set, CommandId::Hset]);
    }

    #[test]
    fn test_check_arity() {
        assert!(CommandId::Ping.check_arity(0).is_ok());
        assert!(CommandId::Ping.check_arity(1).is_ok());
        assert!(CommandId::Ping.check_arity(2).is_err());
        assert!(CommandId::Set.check_arity(1).is_err());
        assert!(CommandId::Set.check_arity(3).is_err());
        assert!(CommandId::Hset.check_arity(3).is_ok());

        let err = CommandId::Get.check_arity(0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ERR wrong number of arguments for 'get' command"
        );
    }

    #[test]
    fn test_ascii_eq_ignore_case() {
        assert!(ascii_eq_ignore_case(b"GET", b"get"));
        assert!(ascii_eq_ignore_case(b"get", b"GET"));
        assert!(!ascii_eq_ignore_case(b"GET", b"SET"));
        assert!(!ascii_eq_ignore_case(b"GET", b"GETS"));
    }
}
