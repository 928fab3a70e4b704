//! Typed view over parsed RPL_ISUPPORT (005) tokens.
//!
//! The grammar yields [`Symbol::ISUPPORT_TOKEN`] trees; this module
//! collects them into an [`Isupport`] map with typed accessors for the
//! parameters clients actually branch on. Values arrive unescaped (the
//! token layer owns the `\xHH` decoding).

use crate::casemap::Casemapping;
use crate::cursor::ByteCursor;
use crate::symbol::Symbol;
use crate::token::{Token, TokenPool};

/// One `KEY[=value]` entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IsupportEntry {
    /// Parameter name, uppercase as sent.
    pub key: String,
    /// Unescaped value; `None` for bare parameters.
    pub value: Option<String>,
    /// True when the token was `-KEY`, withdrawing an advertisement.
    pub negated: bool,
}

/// Collected ISUPPORT advertisements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Isupport {
    entries: Vec<IsupportEntry>,
}

impl Isupport {
    /// Collect entries from a chain of parsed `ISUPPORT_TOKEN` trees.
    pub fn from_tokens(chain: &Token) -> Self {
        let mut entries = Vec::new();
        for tok in chain.siblings() {
            if tok.tag() != Symbol::ISUPPORT_TOKEN {
                continue;
            }
            // Field lookups stay within this token's own child chain;
            // walking from `tok` would run on into its siblings.
            let Some(key) = tok.children().find(|t| t.tag() == Symbol::ISUPPORT_PARAM) else {
                continue;
            };
            let negated = tok.children().any(|t| t.tag() == Symbol::byte(b'-'));
            let value = tok
                .children()
                .find(|t| t.tag() == Symbol::ISUPPORT_VALUE)
                .map(Token::to_text);
            entries.push(IsupportEntry {
                key: key.to_text(),
                value,
                negated,
            });
        }
        Isupport { entries }
    }

    /// Collect entries from a parsed 005 message tree.
    ///
    /// Re-parses each middle parameter after the client name in a second
    /// pass; parameters that are not ISUPPORT tokens (and the trailing
    /// `are supported by this server`) are skipped.
    pub fn from_message(msg: &Token, pool: &mut TokenPool) -> Option<Self> {
        let verb = msg.first_of(Symbol::VERB)?;
        if verb.to_text() != "005" {
            return None;
        }
        let mut entries = Vec::new();
        for param in msg.children().filter(|t| t.tag() == Symbol::MIDDLE).skip(1) {
            let mut cur = ByteCursor::from_chunks(param.span().chunks().to_vec());
            if let Ok(chain) = crate::grammar::parse_isupport(&mut cur, pool) {
                let mut collected = Self::from_tokens(&chain);
                entries.append(&mut collected.entries);
                pool.release(chain);
            }
        }
        Some(Isupport { entries })
    }

    /// All entries in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &IsupportEntry> {
        self.entries.iter()
    }

    /// Current value for a key, honoring later `-KEY` withdrawals. The
    /// outer `Option` is presence, the inner the (possibly absent) value.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        let mut current = None;
        for e in &self.entries {
            if e.key.eq_ignore_ascii_case(key) {
                current = if e.negated {
                    None
                } else {
                    Some(e.value.as_deref())
                };
            }
        }
        current
    }

    /// The advertised case mapping, when recognized.
    pub fn casemapping(&self) -> Option<Casemapping> {
        self.get("CASEMAPPING")
            .flatten()
            .and_then(Casemapping::from_token)
    }

    pub fn chantypes(&self) -> Option<&str> {
        self.get("CHANTYPES").flatten()
    }

    pub fn network(&self) -> Option<&str> {
        self.get("NETWORK").flatten()
    }

    pub fn prefix(&self) -> Option<PrefixSpec> {
        self.get("PREFIX").flatten().and_then(PrefixSpec::parse)
    }

    pub fn chanmodes(&self) -> Option<ChanModes> {
        self.get("CHANMODES").flatten().and_then(ChanModes::parse)
    }

    pub fn has_excepts(&self) -> bool {
        self.get("EXCEPTS").is_some()
    }

    pub fn excepts_mode(&self) -> Option<char> {
        self.get("EXCEPTS").flatten().and_then(|s| s.chars().next())
    }

    pub fn has_invex(&self) -> bool {
        self.get("INVEX").is_some()
    }

    pub fn invex_mode(&self) -> Option<char> {
        self.get("INVEX").flatten().and_then(|s| s.chars().next())
    }

    pub fn targmax(&self) -> Option<TargMax> {
        self.get("TARGMAX").flatten().and_then(TargMax::parse)
    }

    pub fn maxlist(&self) -> Option<MaxList> {
        self.get("MAXLIST").flatten().and_then(MaxList::parse)
    }
}

/// Parsed `PREFIX=(modes)prefixes`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixSpec {
    pub modes: String,
    pub prefixes: String,
}

impl PrefixSpec {
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(rest) = s.strip_prefix('(') {
            let (modes, prefixes) = rest.split_once(')')?;
            if modes.is_empty() || prefixes.is_empty() {
                return None;
            }
            Some(PrefixSpec {
                modes: modes.to_string(),
                prefixes: prefixes.to_string(),
            })
        } else if !s.is_empty() {
            Some(PrefixSpec {
                modes: String::new(),
                prefixes: s.to_string(),
            })
        } else {
            None
        }
    }
}

/// Parsed `CHANMODES=A,B,C,D` type classes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChanModes {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

impl ChanModes {
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(4, ',');
        let (a, b, c, d) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
        Some(ChanModes {
            a: a.to_string(),
            b: b.to_string(),
            c: c.to_string(),
            d: d.to_string(),
        })
    }
}

/// Parsed `TARGMAX=CMD:n,...` limits. An absent number means unlimited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargMax {
    entries: Vec<(String, Option<usize>)>,
}

impl TargMax {
    pub fn parse(s: &str) -> Option<Self> {
        let mut entries = Vec::new();
        for part in s.split(',') {
            if part.is_empty() {
                continue;
            }
            let (cmd, num) = match part.split_once(':') {
                Some((cmd, num)) => (cmd, num.parse::<usize>().ok()),
                None => (part, None),
            };
            if !cmd.is_empty() {
                entries.push((cmd.to_string(), num));
            }
        }
        Some(TargMax { entries })
    }

    pub fn get(&self, cmd: &str) -> Option<Option<usize>> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(cmd))
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<usize>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Parsed `MAXLIST=modes:n,...` list-mode limits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaxList {
    entries: Vec<(char, usize)>,
}

impl MaxList {
    pub fn parse(s: &str) -> Option<Self> {
        let mut entries: Vec<(char, usize)> = Vec::new();
        for part in s.split(',') {
            if part.is_empty() {
                continue;
            }
            let (modes, limit) = part.split_once(':')?;
            let limit: usize = match limit.parse() {
                Ok(n) => n,
                Err(_) => continue,
            };
            for ch in modes.chars() {
                entries.retain(|(c, _)| *c != ch);
                entries.push((ch, limit));
            }
        }
        Some(MaxList { entries })
    }

    pub fn limit_for(&self, mode: char) -> Option<usize> {
        self.entries
            .iter()
            .rev()
            .find(|(c, _)| *c == mode)
            .map(|(_, n)| *n)
    }
}
