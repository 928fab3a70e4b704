//! Mode-string grammar.
//!
//! ```text
//! modestring = 1*( ( '+' / '-' ) *letter )
//! ```
//!
//! The tree alternates [`Symbol::MODE_MODIFIER`] and [`Symbol::MODE_CHARS`]
//! children; each MODE_CHARS holds one terminal token per letter so callers
//! can recover (modifier, letter) pairs in order. A bare `+` yields an
//! empty MODE_CHARS token.

use crate::symbol::Symbol;
use crate::token::{Chain, Token};

use super::classes;
use super::{PResult, Parser};

impl Parser<'_> {
    pub(crate) fn mode_string(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        if !matches!(self.cur.peek(), Some(b'+') | Some(b'-')) {
            return Err(self.fail("mode-string", "'+' or '-'"));
        }

        let mut kids = Chain::new();
        while matches!(self.cur.peek(), Some(b'+') | Some(b'-')) {
            let sign = self.cur.checkpoint();
            self.cur.bump();
            kids.push(
                self.pool
                    .node_spanned(Symbol::MODE_MODIFIER, self.cur.span_since(sign)),
            );

            let chars_start = self.cur.checkpoint();
            let mut letters = Chain::new();
            while let Some(t) = self.terminal_if(classes::is_letter) {
                letters.push(t);
            }
            let chars_span = self.cur.span_since(chars_start);
            kids.push(self.wrap(Symbol::MODE_CHARS, chars_span, letters));
        }

        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::MODE_STRING, span, kids))
    }
}

/// Flatten a parsed mode string into `(modifier, letter)` pairs in order.
pub fn mode_pairs(mode_string: &Token) -> Vec<(char, char)> {
    let mut pairs = Vec::new();
    let mut sign = '+';
    for node in mode_string.children() {
        match node.tag() {
            Symbol::MODE_MODIFIER => {
                if let Some(b) = node.span().first() {
                    sign = b as char;
                }
            }
            Symbol::MODE_CHARS => {
                for letter in node.children() {
                    if let Some(b) = letter.tag().as_byte() {
                        pairs.push((sign, b as char));
                    }
                }
            }
            _ => {}
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::ByteCursor;
    use crate::grammar::parse_mode_string;
    use crate::token::TokenPool;

    fn parse(input: &str) -> Box<Token> {
        let mut cur = ByteCursor::copy_from_slice(input.as_bytes());
        let mut pool = TokenPool::new();
        parse_mode_string(&mut cur, &mut pool).expect("mode string parses")
    }

    #[test]
    fn test_mixed_modes_in_order() {
        let tree = parse("+vohr-jklm");
        assert_eq!(
            mode_pairs(&tree),
            [
                ('+', 'v'),
                ('+', 'o'),
                ('+', 'h'),
                ('+', 'r'),
                ('-', 'j'),
                ('-', 'k'),
                ('-', 'l'),
                ('-', 'm'),
            ]
        );
    }

    #[test]
    fn test_bare_plus_yields_empty_mode_chars() {
        let tree = parse("+");
        let chars = tree.first_of(Symbol::MODE_CHARS).expect("mode chars");
        assert!(chars.is_empty());
        assert!(mode_pairs(&tree).is_empty());
    }

    #[test]
    fn test_missing_modifier_fails() {
        let mut cur = ByteCursor::copy_from_slice(b"ov");
        let mut pool = TokenPool::new();
        let err = parse_mode_string(&mut cur, &mut pool).expect_err("no sign");
        assert_eq!(err.production, "mode-string");
    }

    #[test]
    fn test_stops_at_non_mode_byte() {
        let mut cur = ByteCursor::copy_from_slice(b"+o nick");
        let mut pool = TokenPool::new();
        let tree = parse_mode_string(&mut cur, &mut pool).expect("parses prefix");
        assert_eq!(mode_pairs(&tree), [('+', 'o')]);
        assert_eq!(cur.peek(), Some(b' '));
    }
}
