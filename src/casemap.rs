//! IRC case-mapping oracle.
//!
//! Protocol identifiers (nicknames, channel names) compare under a
//! server-selected case mapping. The grammar itself matches bytes exactly;
//! this module is consumed by higher-level lookup, e.g. resolving the
//! `CASEMAPPING` ISUPPORT token and comparing parsed identifiers.
//!
//! `rfc1459` additionally folds `[]\~` to `{}|^`, a leftover of the
//! Scandinavian origin of the protocol.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A case-mapping scheme for protocol identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Casemapping {
    /// Plain ASCII lowercasing.
    Ascii,
    /// RFC 1459 mapping: ASCII plus `[`→`{`, `]`→`}`, `\`→`|`, `~`→`^`.
    #[default]
    Rfc1459,
}

impl Casemapping {
    /// Resolve a `CASEMAPPING` ISUPPORT value.
    pub fn from_token(value: &str) -> Option<Casemapping> {
        match value {
            "ascii" => Some(Casemapping::Ascii),
            "rfc1459" => Some(Casemapping::Rfc1459),
            _ => None,
        }
    }

    /// Fold a single character.
    pub fn fold_char(self, c: char) -> char {
        match (self, c) {
            (Casemapping::Rfc1459, '[') => '{',
            (Casemapping::Rfc1459, ']') => '}',
            (Casemapping::Rfc1459, '\\') => '|',
            (Casemapping::Rfc1459, '~') => '^',
            (_, 'A'..='Z') => c.to_ascii_lowercase(),
            _ => c,
        }
    }

    /// Fold a whole identifier.
    pub fn fold(self, s: &str) -> String {
        s.chars().map(|c| self.fold_char(c)).collect()
    }

    /// Case-insensitive equality under this mapping.
    pub fn eq(self, a: &str, b: &str) -> bool {
        a.len() == b.len()
            && a.chars()
                .zip(b.chars())
                .all(|(ca, cb)| self.fold_char(ca) == self.fold_char(cb))
    }

    /// Case-insensitive ordering under this mapping.
    pub fn cmp(self, a: &str, b: &str) -> Ordering {
        a.chars()
            .map(|c| self.fold_char(c))
            .cmp(b.chars().map(|c| self.fold_char(c)))
    }

    /// Hash consistent with [`eq`](Self::eq): folded-equal strings hash
    /// equally.
    pub fn hash(self, s: &str) -> u64 {
        let mut h = DefaultHasher::new();
        for c in s.chars() {
            self.fold_char(c).hash(&mut h);
        }
        h.finish()
    }
}

/// Byte-exact equality.
pub fn ordinal_eq(a: &str, b: &str) -> bool {
    a == b
}

/// Byte-exact ordering.
pub fn ordinal_cmp(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}

/// Hash consistent with [`ordinal_eq`].
pub fn ordinal_hash(s: &str) -> u64 {
    let mut h = DefaultHasher::new();
    s.hash(&mut h);
    h.finish()
}

/// Convert a string to IRC lowercase using the RFC 1459 mapping.
pub fn irc_to_lower(s: &str) -> String {
    Casemapping::Rfc1459.fold(s)
}

/// Compare two strings using the RFC 1459 mapping.
pub fn irc_eq(a: &str, b: &str) -> bool {
    Casemapping::Rfc1459.eq(a, b)
}
