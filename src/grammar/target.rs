//! Channel, nickname and message-target grammars.
//!
//! ```text
//! channel   = ( '#' / '&' / '+' / '!' channelid ) chanstring [ ':' chanstring ]
//! channelid = 5( A-Z / digit )
//! msgto     = channel / targetmask / nick!user@host
//!           / user [ '%' host ] '@' server / user '%' host / nickname
//! ```
//!
//! When input could lexically match more than one msgto alternative the
//! priority is fixed: channel first, then target mask, then the user@host
//! forms, then bare nickname. The tie-break tests in `tests/grammar.rs`
//! pin this order.

use crate::symbol::Symbol;
use crate::token::Chain;

use super::classes;
use super::{PResult, Parser};

impl Parser<'_> {
    /// A channel name with prefix, optional safe-channel id, name, and
    /// optional `:`-separated mask suffix.
    pub(crate) fn channel(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();

        match self.cur.peek() {
            Some(b'#') | Some(b'&') | Some(b'+') => {
                let prefix = self.cur.checkpoint();
                self.cur.bump();
                kids.push(
                    self.pool
                        .node_spanned(Symbol::CHANNEL_PREFIX, self.cur.span_since(prefix)),
                );
            }
            Some(b'!') => {
                let prefix = self.cur.checkpoint();
                self.cur.bump();
                kids.push(
                    self.pool
                        .node_spanned(Symbol::CHANNEL_PREFIX, self.cur.span_since(prefix)),
                );
                let id_start = self.cur.checkpoint();
                for _ in 0..5 {
                    match self.cur.peek() {
                        Some(b) if classes::is_chanid(b) => {
                            self.cur.bump();
                        }
                        _ => {
                            let e = self.fail("channel", "five-character channel id");
                            return Err(self.bail(start, kids, e));
                        }
                    }
                }
                kids.push(
                    self.pool
                        .node_spanned(Symbol::CHANNEL_ID, self.cur.span_since(id_start)),
                );
            }
            _ => return Err(self.fail("channel", "channel prefix")),
        }

        let name = self.span_while(classes::is_chanstring);
        if name.is_empty() {
            let e = self.fail("channel", "channel name");
            return Err(self.bail(start, kids, e));
        }
        kids.push(self.pool.node_spanned(Symbol::CHANNEL_NAME, name));

        // Optional mask suffix; the ':' is given back when nothing follows.
        let sep = self.cur.checkpoint();
        if self.eat(b':') {
            let suffix = self.span_while(classes::is_chanstring);
            if suffix.is_empty() {
                self.cur.rewind(sep);
            } else {
                kids.push(self.pool.node_spanned(Symbol::CHANNEL_SUFFIX, suffix));
            }
        }

        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::CHANNEL, span, kids))
    }

    /// A nickname: letter or special, then letters, digits, specials, `-`.
    pub(crate) fn nickname(&mut self) -> PResult {
        match self.cur.peek() {
            Some(b) if classes::is_nick_start(b) => {}
            _ => return Err(self.fail("nickname", "letter or special")),
        }
        let span = self.span_while(classes::is_nick_byte);
        Ok(self.pool.node_spanned(Symbol::NICK, span))
    }

    /// A `$`-server or `#`-host target mask.
    fn target_mask(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        match self.cur.peek() {
            Some(b'$') | Some(b'#') => {
                self.cur.bump();
            }
            _ => return Err(self.fail("target-mask", "'$' or '#'")),
        }
        let mask = self.span_while(classes::is_mask_byte);
        if mask.is_empty() {
            let e = self.fail("target-mask", "mask");
            self.cur.rewind(start);
            return Err(e);
        }
        let span = self.cur.span_since(start);
        Ok(self.pool.node_spanned(Symbol::TARGET_MASK, span))
    }

    /// `nick!user@host`.
    fn nick_user_host(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();
        match self.nickname() {
            Ok(t) => kids.push(t),
            Err(e) => return Err(self.bail(start, kids, e)),
        }
        if !self.eat(b'!') {
            let e = self.fail("msg-target", "'!'");
            return Err(self.bail(start, kids, e));
        }
        let user = self.span_while(classes::is_user_byte);
        if user.is_empty() {
            let e = self.fail("msg-target", "user after '!'");
            return Err(self.bail(start, kids, e));
        }
        kids.push(self.pool.node_spanned(Symbol::USER, user));
        if !self.eat(b'@') {
            let e = self.fail("msg-target", "'@'");
            return Err(self.bail(start, kids, e));
        }
        let host = self.span_while(classes::is_host_byte);
        if host.is_empty() {
            let e = self.fail("msg-target", "host after '@'");
            return Err(self.bail(start, kids, e));
        }
        kids.push(self.pool.node_spanned(Symbol::HOST, host));
        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::MSG_TARGET, span, kids))
    }

    /// `user[%host]@server` and `user%host`.
    fn user_host_target(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();
        let user = self.span_while(classes::is_user_byte);
        if user.is_empty() {
            return Err(self.fail("msg-target", "user"));
        }
        kids.push(self.pool.node_spanned(Symbol::USER, user));

        let mut saw_host = false;
        if self.eat(b'%') {
            let host = self.span_while(|b| classes::is_host_byte(b) && b != b'%');
            if host.is_empty() {
                let e = self.fail("msg-target", "host after '%'");
                return Err(self.bail(start, kids, e));
            }
            kids.push(self.pool.node_spanned(Symbol::HOST, host));
            saw_host = true;
        }
        if self.eat(b'@') {
            let server = self.span_while(classes::is_host_byte);
            if server.is_empty() {
                let e = self.fail("msg-target", "server after '@'");
                return Err(self.bail(start, kids, e));
            }
            kids.push(self.pool.node_spanned(Symbol::HOST, server));
        } else if !saw_host {
            // A bare word is a nickname, not a user target.
            let e = self.fail("msg-target", "'%' or '@'");
            return Err(self.bail(start, kids, e));
        }
        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::MSG_TARGET, span, kids))
    }

    /// One message target, trying alternatives in priority order.
    pub(crate) fn msg_target(&mut self) -> PResult {
        let start = self.cur.checkpoint();

        if let Ok(chan) = self.channel() {
            let span = self.cur.span_since(start);
            return Ok(self.pool.node_with_child(Symbol::MSG_TARGET, span, chan));
        }
        if let Ok(mask) = self.target_mask() {
            let span = self.cur.span_since(start);
            return Ok(self.pool.node_with_child(Symbol::MSG_TARGET, span, mask));
        }
        if let Ok(t) = self.nick_user_host() {
            return Ok(t);
        }
        if let Ok(t) = self.user_host_target() {
            return Ok(t);
        }
        match self.nickname() {
            Ok(nick) => {
                let span = self.cur.span_since(start);
                Ok(self.pool.node_with_child(Symbol::MSG_TARGET, span, nick))
            }
            Err(_) => Err(self.fail("msg-target", "channel, mask, user@host or nickname")),
        }
    }

    /// Comma-separated target list.
    pub(crate) fn target_list(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();
        match self.msg_target() {
            Ok(t) => kids.push(t),
            Err(e) => return Err(self.bail(start, kids, e)),
        }
        loop {
            let sep = self.cur.checkpoint();
            if !self.eat(b',') {
                break;
            }
            match self.msg_target() {
                Ok(t) => kids.push(t),
                Err(_) => {
                    self.cur.rewind(sep);
                    break;
                }
            }
        }
        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::TARGET_LIST, span, kids))
    }

    /// Comma-separated channel-key list.
    pub(crate) fn key_list(&mut self) -> PResult {
        let start = self.cur.checkpoint();
        let mut kids = Chain::new();
        let first = self.span_while(classes::is_key_byte);
        if first.is_empty() {
            return Err(self.fail("key-list", "key"));
        }
        kids.push(self.pool.node_spanned(Symbol::KEY, first));
        loop {
            let sep = self.cur.checkpoint();
            if !self.eat(b',') {
                break;
            }
            let key = self.span_while(classes::is_key_byte);
            if key.is_empty() {
                self.cur.rewind(sep);
                break;
            }
            kids.push(self.pool.node_spanned(Symbol::KEY, key));
        }
        let span = self.cur.span_since(start);
        Ok(self.wrap(Symbol::KEY_LIST, span, kids))
    }
}
