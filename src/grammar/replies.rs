//! Sub-grammars embedded in numeric replies.
//!
//! Numeric replies pack structured text inside already-extracted
//! parameters; callers re-parse those in a second pass through the entry
//! points in [`super`]. Covered here: RPL_ISUPPORT (005) tokens with their
//! escaped values, RPL_NAMREPLY (353) bodies, RPL_WHOREPLY (352) flag
//! fields and RPL_USERHOST (302) reply lists.

use crate::span::Span;
use crate::symbol::Symbol;
use crate::token::Chain;

use super::classes;
use super::{PResult, Parser};

impl Parser<'_> {
    /// Consume ISUPPORT value text, validating `\xHH` escapes as it goes so
    /// extraction after a successful parse cannot fail.
    fn isupport_value_text(&mut self) -> Result<Span, crate::error::ParseError> {
        let start = self.cur.checkpoint();
        while let Some(b) = self.cur.peek() {
            if !classes::is_isupport_value_byte(b) {
                break;
            }
            if b == b'\\' {
                self.cur.bump();
                if !self.eat(b'x') {
                    let e = self.fail("isupport-value", "hex escape");
                    self.cur.rewind(start);
                    return Err(e);
                }
                for _ in 0..2 {
                    match self.cur.peek() {
                        Some(h) if h.is_ascii_hexdigit() => {
                            self.cur.bump();
                        }
                        _ => {
                            let e = self.fail("isupport-value", "two hex digits");
                            self.cur.rewind(start);
                            return Err(e);
                        }
                    }
                }
            } else {
                self.cur.bump();
            }
        }
        Ok(self.cur.span_since(start))
    }

    /// One `[-]PARAM[=value]` ISUPPORT token.
    pub(crate) fn isupport_token(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();

        if let Some(neg) = self.terminal_if(|b| b == b'-') {
            kids.push(neg);
        }

        let param = self.span_while(classes::is_isupport_param_byte);
        if param.is_empty() {
            let e = self.fail("isupport", "parameter name");
            return Err(self.bail(start, kids, e));
        }
        kids.push(self.pool.node_spanned(Symbol::ISUPPORT_PARAM, param));

        if self.eat(b'=') {
            let vstart = self.cur.checkpoint();
            let mut items = Chain::new();
            loop {
                let name = match self.isupport_value_text() {
                    Ok(s) => s,
                    Err(e) => {
                        self.dispose(items);
                        return Err(self.bail(start, kids, e));
                    }
                };
                let mut item = self.pool.node_spanned(Symbol::ISUPPORT_VALUE_ITEM, name);
                if self.eat(b':') {
                    let suffix = match self.isupport_value_text() {
                        Ok(s) => s,
                        Err(e) => {
                            self.pool.release(item);
                            self.dispose(items);
                            return Err(self.bail(start, kids, e));
                        }
                    };
                    let suffix = self.pool.node_spanned(Symbol::ISUPPORT_VALUE_SUFFIX, suffix);
                    item.replace_child(Some(suffix));
                }
                if item.is_empty() && items.is_empty() && self.cur.peek() != Some(b',') {
                    // `KEY=` with an empty value: no items at all.
                    self.pool.release(item);
                    break;
                }
                items.push(item);
                if !self.eat(b',') {
                    break;
                }
            }
            let vspan = self.cur.span_since(vstart);
            let value = self.wrap(Symbol::ISUPPORT_VALUE, vspan, items);
            kids.push(value);
        }

        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::ISUPPORT_TOKEN, span, kids))
    }

    /// A space-separated run of ISUPPORT tokens; yields the chain head.
    pub(crate) fn isupport_list(&mut self) -> PResult {
        let mut kids = Chain::new();
        match self.isupport_token() {
            Ok(t) => kids.push(t),
            Err(e) => return Err(e),
        }
        loop {
            let sep = self.cur.checkpoint();
            if self.skip_spaces() == 0 {
                break;
            }
            match self.isupport_token() {
                Ok(t) => kids.push(t),
                Err(_) => {
                    self.cur.rewind(sep);
                    break;
                }
            }
        }
        match kids.into_head() {
            Some(head) => Ok(head),
            None => Err(self.fail("isupport", "isupport token")),
        }
    }

    /// RPL_NAMREPLY body: visibility marker, channel, then the nick list.
    pub(crate) fn name_reply(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();

        let kind = self.cur.checkpoint();
        match self.cur.peek() {
            Some(b'=') | Some(b'*') | Some(b'@') => {
                self.cur.bump();
            }
            _ => return Err(self.fail("name-reply", "'=', '*' or '@'")),
        }
        kids.push(
            self.pool
                .node_spanned(Symbol::NAME_REPLY_KIND, self.cur.span_since(kind)),
        );

        if self.skip_spaces() == 0 {
            let e = self.fail("name-reply", "space after marker");
            return Err(self.bail(start, kids, e));
        }
        match self.channel() {
            Ok(t) => kids.push(t),
            Err(e) => return Err(self.bail(start, kids, e)),
        }

        self.skip_spaces();
        self.eat(b':');

        let list_start = self.cur.checkpoint();
        let mut items = Chain::new();
        loop {
            match self.nick_list_item() {
                Ok(t) => items.push(t),
                Err(_) => break,
            }
            if self.skip_spaces() == 0 {
                break;
            }
        }
        let list_span = self.cur.span_since(list_start);
        let list = self.wrap(Symbol::NICK_LIST, list_span, items);
        kids.push(list);

        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::NAME_REPLY, span, kids))
    }

    /// One entry of a names list: optional membership prefixes, then nick.
    fn nick_list_item(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();
        while let Some(t) = self.terminal_if(|b| matches!(b, b'~' | b'&' | b'@' | b'%' | b'+')) {
            kids.push(t);
        }
        match self.nickname() {
            Ok(t) => kids.push(t),
            Err(e) => return Err(self.bail(start, kids, e)),
        }
        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::NICK_LIST_ITEM, span, kids))
    }

    /// RPL_WHOREPLY flags: `H`/`G`, optional `*`, optional `@`/`+`.
    pub(crate) fn who_flags(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();
        match self.terminal_if(|b| matches!(b, b'H' | b'G')) {
            Some(t) => kids.push(t),
            None => return Err(self.fail("who-flags", "'H' or 'G'")),
        }
        if let Some(t) = self.terminal_if(|b| b == b'*') {
            kids.push(t);
        }
        if let Some(t) = self.terminal_if(|b| matches!(b, b'@' | b'+')) {
            kids.push(t);
        }
        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::WHO_FLAGS, span, kids))
    }

    /// RPL_USERHOST body: space-separated `nick[*]=(+|-)host` entries.
    pub(crate) fn user_host_list(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();
        match self.user_host_item() {
            Ok(t) => kids.push(t),
            Err(e) => return Err(self.bail(start, kids, e)),
        }
        loop {
            let sep = self.cur.checkpoint();
            if self.skip_spaces() == 0 {
                break;
            }
            match self.user_host_item() {
                Ok(t) => kids.push(t),
                Err(_) => {
                    self.cur.rewind(sep);
                    break;
                }
            }
        }
        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::USER_HOST_LIST, span, kids))
    }

    fn user_host_item(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();
        match self.nickname() {
            Ok(t) => kids.push(t),
            Err(e) => return Err(self.bail(start, kids, e)),
        }
        if let Some(t) = self.terminal_if(|b| b == b'*') {
            kids.push(t);
        }
        if !self.eat(b'=') {
            let e = self.fail("user-host", "'='");
            return Err(self.bail(start, kids, e));
        }
        match self.terminal_if(|b| matches!(b, b'+' | b'-')) {
            Some(t) => kids.push(t),
            None => {
                let e = self.fail("user-host", "'+' or '-'");
                return Err(self.bail(start, kids, e));
            }
        }
        let host = self.span_while(classes::is_source_host_byte);
        if host.is_empty() {
            let e = self.fail("user-host", "hostname");
            return Err(self.bail(start, kids, e));
        }
        kids.push(self.pool.node_spanned(Symbol::HOST, host));
        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::USER_HOST_ITEM, span, kids))
    }
}
