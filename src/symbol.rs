//! Packed grammar-symbol tags.
//!
//! Every token carries a [`Symbol`]: a `u32` whose value alone places it in
//! one of three disjoint bands:
//!
//! | Range                     | Category                |
//! |---------------------------|-------------------------|
//! | `0x0000_0000..=0x0000_00FF` | Terminals, one per byte value |
//! | `0x0000_0100..0x0100_0000`  | Grammar productions     |
//! | `0x0100_0000..`             | Formatting productions  |
//!
//! Band membership is answered by [`Symbol::is_terminal`],
//! [`Symbol::is_production`] and [`Symbol::is_format`]; call sites never do
//! their own bit arithmetic. The bands never overlap.

use std::fmt;

const PRODUCTION_BASE: u32 = 1 << 8;
const FORMAT_BASE: u32 = 1 << 24;

/// Grammar symbol identifying what a token represents.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol(u32);

macro_rules! productions {
    ($($(#[$doc:meta])* $name:ident = $idx:expr;)+) => {
        impl Symbol {
            $($(#[$doc])* pub const $name: Symbol = Symbol(PRODUCTION_BASE + $idx);)+
        }

        fn production_name(sym: Symbol) -> Option<&'static str> {
            match sym {
                $(Symbol::$name => Some(stringify!($name)),)+
                _ => None,
            }
        }
    };
}

macro_rules! format_productions {
    ($($(#[$doc:meta])* $name:ident = $idx:expr;)+) => {
        impl Symbol {
            $($(#[$doc])* pub const $name: Symbol = Symbol(FORMAT_BASE + $idx);)+
        }

        fn format_name(sym: Symbol) -> Option<&'static str> {
            match sym {
                $(Symbol::$name => Some(stringify!($name)),)+
                _ => None,
            }
        }
    };
}

productions! {
    /// Uninitialized or recycled node.
    NULL = 0;
    /// Whole constructed physical line (factory output sentinel).
    CONSTRUCTED = 1;
    /// One parsed wire message (without its CRLF terminator).
    MESSAGE = 2;
    /// The IRCv3 tag block (content between `@` and the first space).
    TAG_LIST = 3;
    /// A single `key[=value]` tag.
    TAG = 4;
    TAG_KEY = 5;
    /// Tag value, stored escaped as on the wire.
    TAG_VALUE = 6;
    /// Message source (content between `:` and the first space).
    SOURCE = 7;
    NICK = 8;
    USER = 9;
    HOST = 10;
    VERB = 11;
    /// A space-delimited parameter.
    MIDDLE = 12;
    /// The final parameter introduced by the `:` marker.
    TRAILING = 13;
    CHANNEL = 14;
    CHANNEL_PREFIX = 15;
    /// Five-character id of a `!`-prefixed safe channel.
    CHANNEL_ID = 16;
    CHANNEL_NAME = 17;
    /// The `:chanstring` mask portion of a channel name.
    CHANNEL_SUFFIX = 18;
    /// Comma-separated list of message targets.
    TARGET_LIST = 19;
    MSG_TARGET = 20;
    /// `$`-prefixed server mask or `#`-prefixed host mask target.
    TARGET_MASK = 21;
    USER_HOST_LIST = 22;
    USER_HOST_ITEM = 23;
    KEY_LIST = 24;
    KEY = 25;
    MODE_STRING = 26;
    /// A `+` or `-` sign introducing a run of mode letters.
    MODE_MODIFIER = 27;
    /// The run of mode letters following one modifier (may be empty).
    MODE_CHARS = 28;
    CTCP_MESSAGE = 29;
    CTCP_COMMAND = 30;
    CTCP_PARAM = 31;
    /// One `[-]PARAM[=value]` ISUPPORT token.
    ISUPPORT_TOKEN = 32;
    ISUPPORT_PARAM = 33;
    /// ISUPPORT value, stored escaped as on the wire.
    ISUPPORT_VALUE = 34;
    ISUPPORT_VALUE_ITEM = 35;
    /// The `:suffix` of a value item, e.g. the `3` of `PRIVMSG:3`.
    ISUPPORT_VALUE_SUFFIX = 36;
    NAME_REPLY = 37;
    /// Channel visibility marker of a names reply: `=`, `*` or `@`.
    NAME_REPLY_KIND = 38;
    NICK_LIST = 39;
    NICK_LIST_ITEM = 40;
    /// WHO reply flags field: `H`/`G`, optional `*`, optional `@`/`+`.
    WHO_FLAGS = 41;
}

format_productions! {
    /// A run of plain text between formatting codes.
    FMT_TEXT = 0;
    FMT_BOLD = 1;
    FMT_ITALIC = 2;
    FMT_UNDERLINE = 3;
    FMT_MONOSPACE = 4;
    FMT_REVERSE = 5;
    /// A color code with optional foreground/background digits.
    FMT_COLOR = 6;
    FMT_HEX_COLOR = 7;
    FMT_RESET = 8;
}

impl Symbol {
    // Named terminals for the control bytes the grammar cares about.

    /// CTCP delimiter byte.
    pub const CTCP_QUOTE: Symbol = Symbol(0x01);
    /// Bold formatting toggle.
    pub const BOLD: Symbol = Symbol(0x02);
    /// mIRC color code.
    pub const COLOR: Symbol = Symbol(0x03);
    /// IRCv3 hex color code.
    pub const HEX_COLOR: Symbol = Symbol(0x04);
    /// Formatting reset.
    pub const RESET: Symbol = Symbol(0x0F);
    /// Monospace toggle.
    pub const MONOSPACE: Symbol = Symbol(0x11);
    /// Reverse-video toggle.
    pub const REVERSE: Symbol = Symbol(0x16);
    /// Italics toggle.
    pub const ITALIC: Symbol = Symbol(0x1D);
    /// Underline toggle.
    pub const UNDERLINE: Symbol = Symbol(0x1F);

    /// The terminal symbol for a byte value.
    pub const fn byte(b: u8) -> Symbol {
        Symbol(b as u32)
    }

    /// The byte value of a terminal symbol.
    pub const fn as_byte(self) -> Option<u8> {
        if self.is_terminal() {
            Some(self.0 as u8)
        } else {
            None
        }
    }

    /// Raw packed value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// True for single-byte terminal symbols.
    pub const fn is_terminal(self) -> bool {
        self.0 < PRODUCTION_BASE
    }

    /// True for grammar productions (including NULL and CONSTRUCTED).
    pub const fn is_production(self) -> bool {
        self.0 >= PRODUCTION_BASE && self.0 < FORMAT_BASE
    }

    /// True for formatting productions.
    pub const fn is_format(self) -> bool {
        self.0 >= FORMAT_BASE
    }

    /// Diagnostic label.
    pub fn name(self) -> &'static str {
        if self.is_terminal() {
            return match self {
                Symbol::CTCP_QUOTE => "CTCP_QUOTE",
                Symbol::BOLD => "BOLD",
                Symbol::COLOR => "COLOR",
                Symbol::HEX_COLOR => "HEX_COLOR",
                Symbol::RESET => "RESET",
                Symbol::MONOSPACE => "MONOSPACE",
                Symbol::REVERSE => "REVERSE",
                Symbol::ITALIC => "ITALIC",
                Symbol::UNDERLINE => "UNDERLINE",
                _ => "byte",
            };
        }
        production_name(self)
            .or_else(|| format_name(self))
            .unwrap_or("unknown")
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Symbol::NULL
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(b) = self.as_byte() {
            write!(f, "Symbol({} {:#04x})", self.name(), b)
        } else {
            write!(f, "Symbol({})", self.name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_are_disjoint() {
        assert!(Symbol::byte(0x00).is_terminal());
        assert!(Symbol::byte(0xFF).is_terminal());
        assert!(!Symbol::byte(0xFF).is_production());

        assert!(Symbol::NULL.is_production());
        assert!(Symbol::MESSAGE.is_production());
        assert!(!Symbol::MESSAGE.is_terminal());
        assert!(!Symbol::MESSAGE.is_format());

        assert!(Symbol::FMT_BOLD.is_format());
        assert!(!Symbol::FMT_BOLD.is_production());
        assert!(!Symbol::FMT_BOLD.is_terminal());
    }

    #[test]
    fn test_byte_round_trip() {
        for b in [0u8, 1, 0x41, 0xFF] {
            assert_eq!(Symbol::byte(b).as_byte(), Some(b));
        }
        assert_eq!(Symbol::MESSAGE.as_byte(), None);
    }

    #[test]
    fn test_null_is_not_the_nul_terminal() {
        assert_ne!(Symbol::NULL, Symbol::byte(0x00));
    }

    #[test]
    fn test_names() {
        assert_eq!(Symbol::MESSAGE.name(), "MESSAGE");
        assert_eq!(Symbol::FMT_COLOR.name(), "FMT_COLOR");
        assert_eq!(Symbol::CTCP_QUOTE.name(), "CTCP_QUOTE");
        assert_eq!(Symbol::byte(b'a').name(), "byte");
    }
}
