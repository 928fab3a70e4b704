//! # slirc-grammar
//!
//! A grammar-driven parser and unparser for the IRC wire protocol
//! (RFC 1459/2812 plus IRCv3 tags, CTCP, ISUPPORT and numeric-reply
//! sub-grammars). Raw, possibly fragmented byte buffers become typed,
//! zero-copy token trees; semantic message fields become protocol-correct
//! byte sequences, split across physical lines when the 512-byte limit
//! demands it.
//!
//! ## Parsing
//!
//! ```rust
//! use slirc_grammar::{ByteCursor, Symbol, Token, TokenPool};
//!
//! let mut cursor = ByteCursor::copy_from_slice(
//!     b"@time=2023-01-01T00:00:00Z :nick!user@host PRIVMSG #rust :Hello!\r\nPING :srv\r\n",
//! );
//! let mut pool = TokenPool::new();
//! let parsed = slirc_grammar::try_parse(&mut cursor, &mut pool);
//! assert!(parsed.ok());
//! assert_eq!(parsed.len(), 2);
//!
//! let first = parsed.messages.as_ref().unwrap();
//! assert_eq!(
//!     first.first_of(Symbol::VERB).map(Token::to_text),
//!     Some("PRIVMSG".to_string())
//! );
//! ```
//!
//! ## Construction
//!
//! ```rust
//! use slirc_grammar::{emit::WireEncode, MessageFactory, TokenPool};
//!
//! let mut factory = MessageFactory::new();
//! let mut pool = TokenPool::new();
//! factory.verb("JOIN").unwrap();
//! factory.parameter("#rust").unwrap();
//! let lines = factory.construct_message(&mut pool).unwrap();
//! assert_eq!(lines.to_wire_bytes(), b"JOIN #rust\r\n");
//! ```
//!
//! Sub-grammar entry points (`parse_channel`, `parse_isupport`,
//! `parse_name_reply`, ...) re-parse text that numeric replies embed in
//! already-extracted parameters.

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod casemap;
pub mod cursor;
pub mod emit;
pub mod error;
pub mod escape;
pub mod factory;
pub mod grammar;
pub mod isupport;
pub mod span;
pub mod symbol;
pub mod token;

pub use self::casemap::{irc_eq, irc_to_lower, Casemapping};
pub use self::cursor::{ByteCursor, Checkpoint};
pub use self::error::{BuildError, EscapeError, ParseError};
pub use self::factory::{FactoryConfig, MessageFactory, Retention, MAX_LINE_LEN, MAX_PARAMS, MAX_TAGS_LEN};
pub use self::grammar::{try_parse, BufferParse};
pub use self::isupport::{ChanModes, Isupport, IsupportEntry, MaxList, PrefixSpec, TargMax};
pub use self::span::Span;
pub use self::symbol::Symbol;
pub use self::token::{Token, TokenPool};
