//! Second-pass scan of parameter text into formatting-band tokens.
//!
//! mIRC and IRCv3 clients embed formatting control bytes in message text.
//! The structural grammar leaves them alone; callers who care re-scan a
//! parameter body through [`super::parse_formatted_text`] and get a flat
//! chain of formatting-band tokens: plain runs as [`Symbol::FMT_TEXT`],
//! each control sequence as its own token spanning the control byte plus
//! any color digits.

use crate::symbol::Symbol;
use crate::token::Chain;

use super::classes;
use super::{PResult, Parser};

impl Parser<'_> {
    pub(crate) fn formatted_text(&mut self) -> PResult {
        let mut kids = Chain::new();

        while let Some(b) = self.cur.peek() {
            let start = self.cur.checkpoint();
            let tag = match b {
                0x02 => {
                    self.cur.bump();
                    Symbol::FMT_BOLD
                }
                0x1D => {
                    self.cur.bump();
                    Symbol::FMT_ITALIC
                }
                0x1F => {
                    self.cur.bump();
                    Symbol::FMT_UNDERLINE
                }
                0x11 => {
                    self.cur.bump();
                    Symbol::FMT_MONOSPACE
                }
                0x16 => {
                    self.cur.bump();
                    Symbol::FMT_REVERSE
                }
                0x0F => {
                    self.cur.bump();
                    Symbol::FMT_RESET
                }
                0x03 => {
                    self.cur.bump();
                    self.color_digits();
                    Symbol::FMT_COLOR
                }
                0x04 => {
                    self.cur.bump();
                    for _ in 0..6 {
                        match self.cur.peek() {
                            Some(h) if h.is_ascii_hexdigit() => {
                                self.cur.bump();
                            }
                            _ => break,
                        }
                    }
                    Symbol::FMT_HEX_COLOR
                }
                _ => {
                    self.span_while(|b| !classes::is_format_control(b));
                    Symbol::FMT_TEXT
                }
            };
            let span = self.cur.span_since(start);
            kids.push(self.pool.node_spanned(tag, span));
        }

        match kids.into_head() {
            Some(head) => Ok(head),
            // Empty input still yields a (single, empty) text token.
            None => Ok(self.pool.node(Symbol::FMT_TEXT)),
        }
    }

    /// Up to two foreground digits, optionally a comma and one or two
    /// background digits. The comma is given back when no digit follows.
    fn color_digits(&mut self) {
        let mut fg = 0;
        while fg < 2 && matches!(self.cur.peek(), Some(b) if classes::is_digit(b)) {
            self.cur.bump();
            fg += 1;
        }
        if fg == 0 {
            return;
        }
        let sep = self.cur.checkpoint();
        if self.eat(b',') {
            let mut bg = 0;
            while bg < 2 && matches!(self.cur.peek(), Some(b) if classes::is_digit(b)) {
                self.cur.bump();
                bg += 1;
            }
            if bg == 0 {
                self.cur.rewind(sep);
            }
        }
    }
}
