//! The message production and its direct constituents.
//!
//! ```text
//! message  = [ '@' tags SPACE ] [ ':' source SPACE ] verb params
//! params   = *( SPACE middle ) [ SPACE ':' trailing ]
//! ```
//!
//! A middle or trailing parameter whose first byte is the CTCP delimiter
//! gets a nested [`Symbol::CTCP_MESSAGE`] attached as its child; the
//! parameter itself stays a plain member of the parameter list.

use crate::cursor::ByteCursor;
use crate::symbol::Symbol;
use crate::token::{Chain, Token};

use super::classes;
use super::{PResult, Parser};

impl Parser<'_> {
    /// One wire message, not including its CRLF terminator.
    pub(crate) fn message(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();

        if self.cur.peek() == Some(b'@') {
            match self.tag_list() {
                Ok(t) => kids.push(t),
                Err(e) => return Err(self.bail(start, kids, e)),
            }
            if self.skip_spaces() == 0 {
                let e = self.fail("message", "space after tag block");
                return Err(self.bail(start, kids, e));
            }
        }

        if self.cur.peek() == Some(b':') {
            match self.source() {
                Ok(t) => kids.push(t),
                Err(e) => return Err(self.bail(start, kids, e)),
            }
            if self.skip_spaces() == 0 {
                let e = self.fail("message", "space after source");
                return Err(self.bail(start, kids, e));
            }
        }

        match self.verb() {
            Ok(t) => kids.push(t),
            Err(e) => return Err(self.bail(start, kids, e)),
        }

        loop {
            let sep = self.cur.checkpoint();
            if self.skip_spaces() == 0 {
                break;
            }
            match self.cur.peek() {
                None | Some(b'\r') | Some(b'\n') => {
                    self.cur.rewind(sep);
                    break;
                }
                Some(b':') => {
                    match self.trailing() {
                        Ok(t) => kids.push(t),
                        Err(e) => return Err(self.bail(start, kids, e)),
                    }
                    break;
                }
                _ => match self.middle() {
                    Ok(t) => kids.push(t),
                    Err(e) => return Err(self.bail(start, kids, e)),
                },
            }
        }

        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::MESSAGE, span, kids))
    }

    /// The IRCv3 tag block. The token's span covers the content between the
    /// `@` marker and the terminating space.
    fn tag_list(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        if !self.eat(b'@') {
            return Err(self.fail("tag-list", "'@'"));
        }
        let body = self.cur.checkpoint();
        let mut tags = Chain::new();
        match self.tag() {
            Ok(t) => tags.push(t),
            Err(e) => return Err(self.bail(start, tags, e)),
        }
        loop {
            let sep = self.cur.checkpoint();
            if !self.eat(b';') {
                break;
            }
            match self.tag() {
                Ok(t) => tags.push(t),
                Err(_) => {
                    self.cur.rewind(sep);
                    break;
                }
            }
        }
        let span = self.cur.span_since(body);
        Ok(self.wrap(Symbol::TAG_LIST, span, tags))
    }

    /// One `key[=value]` tag. The value child is present iff `=` was, so
    /// `key=` (empty value) and bare `key` stay distinguishable.
    fn tag(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let key = self.span_while(classes::is_tag_key_byte);
        if key.is_empty() {
            return Err(self.fail("tag", "tag key"));
        }
        let mut kids = Chain::new();
        kids.push(self.pool.node_spanned(Symbol::TAG_KEY, key));
        if self.eat(b'=') {
            let value = self.span_while(classes::is_tag_value_byte);
            kids.push(self.pool.node_spanned(Symbol::TAG_VALUE, value));
        }
        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::TAG, span, kids))
    }

    /// Message source. The span covers the content after the `:` marker;
    /// children decompose it into nick, user and host where present.
    fn source(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        if !self.eat(b':') {
            return Err(self.fail("source", "':'"));
        }
        let body = self.cur.checkpoint();
        let mut kids = Chain::new();

        let nick = self.span_while(classes::is_source_nick_byte);
        if nick.is_empty() {
            let e = self.fail("source", "source name");
            return Err(self.bail(start, kids, e));
        }
        kids.push(self.pool.node_spanned(Symbol::NICK, nick));

        if self.eat(b'!') {
            let user = self.span_while(classes::is_source_user_byte);
            if user.is_empty() {
                let e = self.fail("source", "user after '!'");
                return Err(self.bail(start, kids, e));
            }
            kids.push(self.pool.node_spanned(Symbol::USER, user));
        }

        if self.eat(b'@') {
            let host = self.span_while(classes::is_source_host_byte);
            if host.is_empty() {
                let e = self.fail("source", "host after '@'");
                return Err(self.bail(start, kids, e));
            }
            kids.push(self.pool.node_spanned(Symbol::HOST, host));
        }

        let span = self.cur.span_since(body);
        Ok(self.wrap(Symbol::SOURCE, span, kids))
    }

    /// Command verb: a run of letters, or exactly three digits.
    fn verb(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        match self.cur.peek() {
            Some(b) if classes::is_letter(b) => {
                let span = self.span_while(classes::is_letter);
                Ok(self.pool.node_spanned(Symbol::VERB, span))
            }
            Some(b) if classes::is_digit(b) => {
                for _ in 0..3 {
                    match self.cur.peek() {
                        Some(d) if classes::is_digit(d) => {
                            self.cur.bump();
                        }
                        _ => {
                            let e = self.fail("verb", "three-digit numeric");
                            self.cur.rewind(start);
                            return Err(e);
                        }
                    }
                }
                if matches!(self.cur.peek(), Some(d) if classes::is_digit(d)) {
                    let e = self.fail("verb", "three-digit numeric");
                    self.cur.rewind(start);
                    return Err(e);
                }
                let span = self.cur.span_since(start);
                Ok(self.pool.node_spanned(Symbol::VERB, span))
            }
            _ => Err(self.fail("verb", "letters or three-digit numeric")),
        }
    }

    /// A space-delimited parameter.
    fn middle(&mut self) -> PResult {
        match self.cur.peek() {
            Some(b) if b != b':' && classes::is_param_byte(b) => {}
            _ => return Err(self.fail("middle", "parameter byte")),
        }
        let span = self.span_while(classes::is_param_byte);
        let mut tok = self.pool.node_spanned(Symbol::MIDDLE, span);
        self.attach_ctcp(&mut tok);
        Ok(tok)
    }

    /// The final parameter after the `:` marker; may be empty and may
    /// contain spaces. The span excludes the marker.
    fn trailing(&mut self) -> PResult {
        if !self.eat(b':') {
            return Err(self.fail("trailing", "':'"));
        }
        let span = self.span_while(classes::is_trailing_byte);
        let mut tok = self.pool.node_spanned(Symbol::TRAILING, span);
        self.attach_ctcp(&mut tok);
        Ok(tok)
    }

    /// Attach a nested CTCP parse to a parameter that starts with the CTCP
    /// delimiter. A malformed CTCP body leaves the parameter as plain text.
    fn attach_ctcp(&mut self, param: &mut Token) {
        if param.span().first() != Some(0x01) {
            return;
        }
        let mut sub = ByteCursor::from_chunks(param.span().chunks().to_vec());
        let mut nested = Parser::new(&mut sub, self.pool);
        if let Ok(ctcp) = nested.ctcp() {
            param.replace_child(Some(ctcp));
        }
    }

    /// CTCP/DCC sub-message: delimiter, command, space-separated arguments
    /// (plain or double-quoted), optional closing delimiter.
    pub(crate) fn ctcp(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        if !self.eat(0x01) {
            return Err(self.fail("ctcp", "CTCP delimiter"));
        }
        let mut kids = Chain::new();

        let command = self.span_while(classes::is_ctcp_byte);
        if command.is_empty() {
            let e = self.fail("ctcp", "CTCP command");
            return Err(self.bail(start, kids, e));
        }
        kids.push(self.pool.node_spanned(Symbol::CTCP_COMMAND, command));

        loop {
            let sep = self.cur.checkpoint();
            if !self.eat(b' ') {
                break;
            }
            if self.cur.peek() == Some(b'"') {
                // Quoted argument, as DCC uses for file names with spaces.
                let qstart = self.cur.checkpoint();
                self.cur.bump();
                self.span_while(|b| !matches!(b, b'"' | 0x01 | b'\r' | b'\n' | 0x00));
                if !self.eat(b'"') {
                    self.cur.rewind(sep);
                    break;
                }
                let span = self.cur.span_since(qstart);
                kids.push(self.pool.node_spanned(Symbol::CTCP_PARAM, span));
            } else {
                let arg = self.span_while(classes::is_ctcp_byte);
                if arg.is_empty() {
                    self.cur.rewind(sep);
                    break;
                }
                kids.push(self.pool.node_spanned(Symbol::CTCP_PARAM, arg));
            }
        }

        self.eat(0x01);
        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::CTCP_MESSAGE, span, kids))
    }
}

#[cfg(test)]
mod tests {
    use crate::cursor::ByteCursor;
    use crate::grammar::{parse_ctcp, parse_message};
    use crate::symbol::Symbol;
    use crate::token::{Token, TokenPool};

    fn parse(input: &str) -> Box<Token> {
        let mut cur = ByteCursor::copy_from_slice(input.as_bytes());
        let mut pool = TokenPool::new();
        parse_message(&mut cur, &mut pool).expect("message should parse")
    }

    fn param_texts(msg: &Token) -> Vec<String> {
        msg.children()
            .filter(|t| matches!(t.tag(), Symbol::MIDDLE | Symbol::TRAILING))
            .map(Token::to_text)
            .collect()
    }

    #[test]
    fn test_bare_verb() {
        let msg = parse("PING");
        assert_eq!(msg.tag(), Symbol::MESSAGE);
        assert_eq!(
            msg.first_of(Symbol::VERB).map(Token::to_text),
            Some("PING".into())
        );
        assert!(msg.first_of(Symbol::TAG_LIST).is_none());
        assert!(msg.first_of(Symbol::SOURCE).is_none());
    }

    #[test]
    fn test_full_message() {
        let msg = parse("@time=2023-01-01T00:00:00Z;id=abc :nick!user@host PRIVMSG #chan :Hello world");
        let tags = msg.first_of(Symbol::TAG_LIST).expect("tag block");
        assert_eq!(tags.children().count(), 2);
        let source = msg.first_of(Symbol::SOURCE).expect("source");
        assert_eq!(
            source.first_of(Symbol::NICK).map(Token::to_text),
            Some("nick".into())
        );
        assert_eq!(
            source.first_of(Symbol::USER).map(Token::to_text),
            Some("user".into())
        );
        assert_eq!(
            source.first_of(Symbol::HOST).map(Token::to_text),
            Some("host".into())
        );
        assert_eq!(
            msg.first_of(Symbol::VERB).map(Token::to_text),
            Some("PRIVMSG".into())
        );
        assert_eq!(param_texts(&msg), ["#chan", "Hello world"]);
    }

    #[test]
    fn test_numeric_verb() {
        let msg = parse(":server 001 nick :Welcome");
        assert_eq!(
            msg.first_of(Symbol::VERB).map(Token::to_text),
            Some("001".into())
        );
    }

    #[test]
    fn test_four_digit_verb_fails() {
        let mut cur = ByteCursor::copy_from_slice(b"0001 x");
        let mut pool = TokenPool::new();
        let err = parse_message(&mut cur, &mut pool).expect_err("four digits");
        assert_eq!(err.production, "verb");
        // The cursor rewound: nothing was consumed.
        assert_eq!(cur.position(), 0);
    }

    #[test]
    fn test_empty_trailing() {
        let msg = parse("PRIVMSG #chan :");
        assert_eq!(param_texts(&msg), ["#chan", ""]);
        let trailing = msg.first_of(Symbol::TRAILING).expect("trailing");
        assert!(trailing.is_empty());
    }

    #[test]
    fn test_colon_inside_middle() {
        let msg = parse("USER guest 0 * :Real Name");
        assert_eq!(param_texts(&msg), ["guest", "0", "*", "Real Name"]);
    }

    #[test]
    fn test_tag_value_unescaped_by_to_text() {
        let msg = parse("@msg=hello\\sworld PING");
        let value = msg.first_of(Symbol::TAG_VALUE).expect("value");
        assert_eq!(value.to_text(), "hello world");
    }

    #[test]
    fn test_tag_without_value_vs_empty_value() {
        let msg = parse("@a;b= PING");
        let tags: Vec<_> = msg.all_of(Symbol::TAG).collect();
        assert_eq!(tags.len(), 2);
        assert!(!tags[0].children().any(|t| t.tag() == Symbol::TAG_VALUE));
        assert!(tags[1].children().any(|t| t.tag() == Symbol::TAG_VALUE));
    }

    #[test]
    fn test_ctcp_nested_in_trailing() {
        let msg = parse("PRIVMSG #chan :\u{1}ACTION waves hello\u{1}");
        let trailing = msg.first_of(Symbol::TRAILING).expect("trailing");
        let ctcp = trailing.child().expect("nested CTCP");
        assert_eq!(ctcp.tag(), Symbol::CTCP_MESSAGE);
        assert_eq!(
            ctcp.first_of(Symbol::CTCP_COMMAND).map(Token::to_text),
            Some("ACTION".into())
        );
        let args: Vec<_> = ctcp.all_of(Symbol::CTCP_PARAM).map(|t| t.to_text()).collect();
        assert_eq!(args, ["waves", "hello"]);
        // The CTCP stays nested, not spliced into the parameter list.
        assert_eq!(param_texts(&msg).len(), 2);
    }

    #[test]
    fn test_dcc_quoted_argument() {
        let mut cur = ByteCursor::copy_from_slice(b"\x01DCC SEND \"my file.txt\" 3232235777 6667\x01");
        let mut pool = TokenPool::new();
        let ctcp = parse_ctcp(&mut cur, &mut pool).expect("dcc parses");
        let args: Vec<_> = ctcp.all_of(Symbol::CTCP_PARAM).map(|t| t.to_text()).collect();
        assert_eq!(args, ["SEND", "\"my file.txt\"", "3232235777", "6667"]);
    }

    #[test]
    fn test_malformed_ctcp_left_as_text() {
        // Lone delimiter with no command: parameter survives as plain text.
        let msg = parse("PRIVMSG #chan :\u{1}");
        let trailing = msg.first_of(Symbol::TRAILING).expect("trailing");
        assert!(trailing.child().is_none());
    }

    #[test]
    fn test_missing_verb_fails() {
        let mut cur = ByteCursor::copy_from_slice(b":only.a.source ");
        let mut pool = TokenPool::new();
        let err = parse_message(&mut cur, &mut pool).expect_err("no verb");
        assert_eq!(err.production, "verb");
        assert_eq!(cur.position(), 0);
    }

    #[test]
    fn test_segmented_input_parses_identically() {
        let raw = b"@k=v :n!u@h PRIVMSG #chan :split across chunks";
        let chunks: Vec<bytes::Bytes> = raw
            .chunks(3)
            .map(bytes::Bytes::copy_from_slice)
            .collect();
        let mut cur = ByteCursor::from_chunks(chunks);
        let mut pool = TokenPool::new();
        let msg = parse_message(&mut cur, &mut pool).expect("segmented parse");
        assert_eq!(param_texts(&msg), ["#chan", "split across chunks"]);
    }
}
