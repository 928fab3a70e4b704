//! Recursive-descent grammar over IRC wire bytes.
//!
//! One parse function per grammar production, each consuming exactly the
//! bytes that belong to that production or failing with the cursor rewound
//! to where it started. Productions compose bottom-up from byte classes to
//! whole messages:
//!
//! - sequences rewind wholly when a required element fails;
//! - optionals and repetitions rewind and yield absence instead of failing;
//! - lists rewind past a consumed separator when the following item fails;
//! - alternatives try in a fixed priority order.
//!
//! [`try_parse`] is the buffer-level entry point. The `parse_*` functions
//! are independently invokable sub-grammar entry points: several numeric
//! replies embed sub-grammars inside an already-extracted parameter, which
//! callers re-parse in a second pass (e.g. [`parse_isupport`],
//! [`parse_name_reply`]).

mod classes;
mod format;
mod message;
mod mode;
mod replies;
mod target;

pub use mode::mode_pairs;

use tracing::trace;

use crate::cursor::{ByteCursor, Checkpoint};
use crate::error::ParseError;
use crate::symbol::Symbol;
use crate::token::{Chain, Token, TokenPool};

pub(crate) type PResult = Result<Box<Token>, ParseError>;

/// Parsing context: the cursor being consumed and the pool nodes come from.
pub(crate) struct Parser<'p> {
    cur: &'p mut ByteCursor,
    pool: &'p mut TokenPool,
}

impl<'p> Parser<'p> {
    pub(crate) fn new(cur: &'p mut ByteCursor, pool: &'p mut TokenPool) -> Self {
        Parser { cur, pool }
    }

    fn fail(&self, production: &'static str, expected: &'static str) -> ParseError {
        ParseError {
            production,
            expected,
            offset: self.cur.position(),
        }
    }

    /// Rewind, return partial work to the pool, and propagate the error.
    fn bail(&mut self, at: Checkpoint, partial: Chain, err: ParseError) -> ParseError {
        self.cur.rewind(at);
        self.dispose(partial);
        err
    }

    fn dispose(&mut self, partial: Chain) {
        if let Some(head) = partial.into_head() {
            self.pool.release(head);
        }
    }

    /// Consume one expected byte without producing a token.
    fn eat(&mut self, b: u8) -> bool {
        if self.cur.peek() == Some(b) {
            self.cur.bump();
            true
        } else {
            false
        }
    }

    /// Consume one byte of a class into a terminal token.
    fn terminal_if<F: Fn(u8) -> bool>(&mut self, pred: F) -> Option<Box<Token>> {
        let cp = self.cur.checkpoint();
        match self.cur.peek() {
            Some(b) if pred(b) => {
                self.cur.bump();
                Some(self.pool.node_spanned(Symbol::byte(b), self.cur.span_since(cp)))
            }
            _ => None,
        }
    }

    /// Consume bytes while the class matches; the span may be empty.
    fn span_while<F: Fn(u8) -> bool>(&mut self, pred: F) -> crate::span::Span {
        let cp = self.cur.checkpoint();
        while let Some(b) = self.cur.peek() {
            if !pred(b) {
                break;
            }
            self.cur.bump();
        }
        self.cur.span_since(cp)
    }

    /// Consume one or more spaces.
    fn skip_spaces(&mut self) -> usize {
        let mut n = 0;
        while self.eat(b' ') {
            n += 1;
        }
        n
    }

    /// Wrap a built child chain under a production token.
    fn wrap(&mut self, tag: Symbol, span: crate::span::Span, kids: Chain) -> Box<Token> {
        match kids.into_head() {
            Some(head) => self.pool.node_with_child(tag, span, head),
            None => self.pool.node_spanned(tag, span),
        }
    }
}

/// Result of parsing a buffer of zero or more CRLF-terminated messages.
#[derive(Debug)]
pub struct BufferParse {
    /// Chain of one [`Symbol::MESSAGE`] token per complete line parsed.
    pub messages: Option<Box<Token>>,
    /// One entry per malformed line encountered; parsing continued past
    /// each of them.
    pub diagnostics: Vec<ParseError>,
    /// Absolute byte offset where unconsumed input begins. Streaming
    /// callers keep everything from here on as the partial last line.
    pub remainder: usize,
}

impl BufferParse {
    /// True when every complete line in the buffer parsed cleanly.
    pub fn ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of messages parsed.
    pub fn len(&self) -> usize {
        self.messages.as_ref().map_or(0, |m| m.siblings().count())
    }

    /// True when no message was parsed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_none()
    }
}

/// True when a line terminator exists ahead; never consumes.
fn has_terminator(cur: &mut ByteCursor) -> bool {
    let cp = cur.checkpoint();
    let mut found = false;
    while let Some(b) = cur.bump() {
        if b == b'\n' || b == b'\r' {
            found = true;
            break;
        }
    }
    cur.rewind(cp);
    found
}

/// Consume up to and including the next line terminator.
fn skip_past_terminator(cur: &mut ByteCursor) {
    while let Some(b) = cur.bump() {
        if b == b'\n' {
            break;
        }
        if b == b'\r' {
            // Swallow the LF of a CRLF pair.
            if cur.peek() == Some(b'\n') {
                cur.bump();
            }
            break;
        }
    }
}

/// Parse every complete CRLF-terminated message in the buffer.
///
/// Malformed lines become diagnostics and parsing continues with the next
/// line; a trailing line with no terminator is left unconsumed and reported
/// through [`BufferParse::remainder`]. This never panics and never fails as
/// a whole.
pub fn try_parse(cur: &mut ByteCursor, pool: &mut TokenPool) -> BufferParse {
    let mut messages = Chain::new();
    let mut diagnostics = Vec::new();

    loop {
        // Stray empty lines are not messages.
        while matches!(cur.peek(), Some(b'\r') | Some(b'\n')) {
            cur.bump();
        }
        if cur.at_end() {
            break;
        }
        let line_start = cur.checkpoint();
        if !has_terminator(cur) {
            break;
        }

        let mut parser = Parser::new(cur, pool);
        match parser.message() {
            Ok(msg) => {
                // Tolerate trailing spaces before the terminator.
                while cur.peek() == Some(b' ') {
                    cur.bump();
                }
                if matches!(cur.peek(), Some(b'\r') | Some(b'\n')) {
                    skip_past_terminator(cur);
                    messages.push(msg);
                } else {
                    // The line held trailing junk the grammar cannot own.
                    let err = ParseError {
                        production: "message",
                        expected: "CRLF",
                        offset: cur.position(),
                    };
                    pool.release(msg);
                    diagnostics.push(err);
                    cur.rewind(line_start);
                    skip_past_terminator(cur);
                }
            }
            Err(err) => {
                diagnostics.push(err);
                cur.rewind(line_start);
                skip_past_terminator(cur);
            }
        }
    }

    let parsed = messages.iter().count();
    trace!(
        messages = parsed,
        diagnostics = diagnostics.len(),
        remainder = cur.position(),
        "parsed buffer"
    );
    BufferParse {
        messages: messages.into_head(),
        diagnostics,
        remainder: cur.position(),
    }
}

/// Parse a single message (without its CRLF terminator).
pub fn parse_message(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).message()
}

/// Parse a channel name: `#`, `&`, `+`, or `!` + five-char id.
pub fn parse_channel(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).channel()
}

/// Parse a nickname.
pub fn parse_nickname(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).nickname()
}

/// Parse a comma-separated message-target list.
pub fn parse_msg_target(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).target_list()
}

/// Parse a mode string such as `+vohr-jklm`.
pub fn parse_mode_string(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).mode_string()
}

/// Parse a comma-separated channel-key list.
pub fn parse_key_list(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).key_list()
}

/// Parse the body of an RPL_NAMREPLY parameter sequence.
pub fn parse_name_reply(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).name_reply()
}

/// Parse the flags field of an RPL_WHOREPLY.
pub fn parse_who_flags(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).who_flags()
}

/// Parse the trailing body of an RPL_USERHOST reply.
pub fn parse_user_host_list(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).user_host_list()
}

/// Parse one `[-]PARAM[=value]` ISUPPORT token.
pub fn parse_isupport_token(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).isupport_token()
}

/// Parse a space-separated run of ISUPPORT tokens; returns the chain head.
pub fn parse_isupport(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).isupport_list()
}

/// Parse a CTCP/DCC sub-message delimited by 0x01.
pub fn parse_ctcp(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).ctcp()
}

/// Scan text into formatting-band tokens; returns the chain head.
pub fn parse_formatted_text(cur: &mut ByteCursor, pool: &mut TokenPool) -> Result<Box<Token>, ParseError> {
    Parser::new(cur, pool).formatted_text()
}
