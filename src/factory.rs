//! Message factory and unparser.
//!
//! A [`MessageFactory`] accumulates semantic fields (tags, source, verb,
//! parameters) and serializes them into [`Symbol::CONSTRUCTED`] token
//! chains, one token per physical wire line. Construction enforces the
//! protocol's length and cardinality limits as the fields arrive:
//!
//! - a parameter that does not fit the current line is split at word
//!   boundaries across continuation lines that repeat source, verb and
//!   tags per the configured [`Retention`] policy;
//! - the 16th parameter opens a continuation line the same way;
//! - an oversized verb, source or tag block, or a space-free parameter too
//!   long for any line, fails at the offending call rather than at
//!   serialization.
//!
//! ```
//! use slirc_grammar::{MessageFactory, TokenPool};
//!
//! let mut factory = MessageFactory::new();
//! let mut pool = TokenPool::new();
//! factory.source_prefix("irc.example.net").unwrap();
//! factory.verb("PRIVMSG").unwrap();
//! factory.parameter("#rust").unwrap();
//! factory.parameter("hello from the factory").unwrap();
//! let lines = factory.construct_message(&mut pool).unwrap();
//! assert_eq!(
//!     lines.span().to_bytes().as_ref(),
//!     b":irc.example.net PRIVMSG #rust :hello from the factory\r\n"
//! );
//! ```

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::BuildError;
use crate::escape::escape_tag_value;
use crate::span::Span;
use crate::symbol::Symbol;
use crate::token::{Chain, Token, TokenPool};

/// Maximum physical line length including CRLF.
pub const MAX_LINE_LEN: usize = 512;

/// Maximum serialized tag block length including `@` and trailing space.
pub const MAX_TAGS_LEN: usize = 8191;

/// Maximum parameters per physical message.
pub const MAX_PARAMS: usize = 15;

/// What a continuation line inherits from the message it continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Retention {
    /// Repeat the source on continuation lines.
    pub keep_source: bool,
    /// Repeat the tag block on continuation lines.
    pub keep_tags: bool,
    /// Repeat this many leading parameters on continuation lines.
    pub keep_params: usize,
}

impl Default for Retention {
    fn default() -> Self {
        Retention {
            keep_source: true,
            keep_tags: true,
            keep_params: 0,
        }
    }
}

/// Factory limits and policies.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactoryConfig {
    /// Physical line budget including CRLF.
    pub max_line_len: usize,
    /// Independent tag-block budget including `@` and trailing space.
    pub max_tags_len: usize,
    /// Parameter cap per physical message.
    pub max_params: usize,
    /// When true the tag block consumes the line budget; when false it is
    /// only checked against [`max_tags_len`](Self::max_tags_len), matching
    /// servers that grant tags a separate allowance.
    pub tags_count_toward_line: bool,
    /// Continuation-line inheritance.
    pub retention: Retention,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        FactoryConfig {
            max_line_len: MAX_LINE_LEN,
            max_tags_len: MAX_TAGS_LEN,
            max_params: MAX_PARAMS,
            tags_count_toward_line: false,
            retention: Retention::default(),
        }
    }
}

/// True when a parameter must carry the `:` trailing marker.
fn needs_colon_marker(s: &str) -> bool {
    s.is_empty() || s.contains(' ') || s.starts_with(':')
}

/// One physical line under construction.
#[derive(Clone, Debug, Default)]
struct LineBuf {
    tags: Vec<(String, Option<String>)>,
    source: Option<String>,
    verb: Option<String>,
    params: Vec<String>,
    tags_inherited: bool,
    source_inherited: bool,
    /// Set once a parameter needing the trailing marker is placed; no
    /// further parameter may follow it on this line.
    closed: bool,
}

impl LineBuf {
    /// Serialized tag block length including `@` and trailing space.
    fn tag_block_len(&self) -> usize {
        if self.tags.is_empty() {
            return 0;
        }
        let mut n = 2 + self.tags.len() - 1;
        for (key, value) in &self.tags {
            n += key.len();
            if let Some(v) = value {
                n += 1 + escape_tag_value(v).len();
            }
        }
        n
    }

    /// Serialized length of everything after the tag block, incl. CRLF.
    fn body_len(&self) -> usize {
        let mut n = 0;
        if let Some(source) = &self.source {
            n += 1 + source.len() + 1;
        }
        if let Some(verb) = &self.verb {
            n += verb.len();
        }
        let last = self.params.len().checked_sub(1);
        for (i, p) in self.params.iter().enumerate() {
            n += 1 + p.len();
            if Some(i) == last && needs_colon_marker(p) {
                n += 1;
            }
        }
        n + 2
    }

    fn push_param(&mut self, text: &str) {
        if needs_colon_marker(text) {
            self.closed = true;
        }
        self.params.push(text.to_string());
    }
}

/// Builder of one logical message session; see the module docs.
#[derive(Debug, Default)]
pub struct MessageFactory {
    config: FactoryConfig,
    queue: Vec<LineBuf>,
    cur: LineBuf,
}

impl MessageFactory {
    /// A factory with the default IRC limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with explicit limits and policies.
    pub fn with_config(config: FactoryConfig) -> Self {
        MessageFactory {
            config,
            queue: Vec::new(),
            cur: LineBuf::default(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Discard all accumulated state.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.cur = LineBuf::default();
    }

    fn line_len(&self, line: &LineBuf) -> usize {
        let mut n = line.body_len();
        if self.config.tags_count_toward_line {
            n += line.tag_block_len();
        }
        n
    }

    /// Whether `text` fits as one whole new parameter on `line`.
    fn fits(&self, line: &LineBuf, text: &str) -> bool {
        let extra = 1 + text.len() + usize::from(needs_colon_marker(text));
        self.line_len(line) + extra <= self.config.max_line_len
    }

    /// Append one tag.
    ///
    /// # Errors
    ///
    /// Fails when the tag block was inherited through retention, or when
    /// the appended tag pushes the block past its budget.
    pub fn tag(&mut self, key: &str, value: Option<&str>) -> Result<(), BuildError> {
        if self.cur.tags_inherited {
            return Err(BuildError::TagsInherited);
        }
        self.cur.tags.push((key.to_string(), value.map(String::from)));
        let len = self.cur.tag_block_len();
        if len > self.config.max_tags_len {
            self.cur.tags.pop();
            return Err(BuildError::TagBudgetExceeded {
                len,
                limit: self.config.max_tags_len,
            });
        }
        if self.config.tags_count_toward_line {
            let line = self.line_len(&self.cur);
            if line > self.config.max_line_len {
                self.cur.tags.pop();
                return Err(BuildError::TagBudgetExceeded {
                    len: line,
                    limit: self.config.max_line_len,
                });
            }
        }
        Ok(())
    }

    /// Set the message source. Once per message.
    pub fn source_prefix(&mut self, text: &str) -> Result<(), BuildError> {
        if self.cur.source_inherited {
            return Err(BuildError::SourceInherited);
        }
        if self.cur.source.is_some() {
            return Err(BuildError::SourceAlreadySet);
        }
        // ':' + source + ' ' + CRLF must leave the line representable.
        let len = 1 + text.len() + 1 + 2;
        if len > self.config.max_line_len {
            return Err(BuildError::SourceTooLong {
                len,
                limit: self.config.max_line_len,
            });
        }
        self.cur.source = Some(text.to_string());
        Ok(())
    }

    /// Set the verb. Once per message, mandatory before construction.
    pub fn verb(&mut self, text: &str) -> Result<(), BuildError> {
        if self.cur.verb.is_some() {
            return Err(BuildError::VerbAlreadySet);
        }
        self.cur.verb = Some(text.to_string());
        let len = self.line_len(&self.cur);
        if len > self.config.max_line_len {
            self.cur.verb = None;
            return Err(BuildError::VerbTooLong {
                len,
                limit: self.config.max_line_len,
            });
        }
        Ok(())
    }

    /// The continuation line a split or overflow would open now.
    fn continuation_template(&self) -> LineBuf {
        let r = self.config.retention;
        let params: Vec<String> = self
            .cur
            .params
            .iter()
            .take(r.keep_params)
            // A retained parameter needing the trailing marker would seal
            // the line before anything could follow it.
            .take_while(|p| !needs_colon_marker(p))
            .cloned()
            .collect();
        LineBuf {
            tags: if r.keep_tags {
                self.cur.tags.clone()
            } else {
                Vec::new()
            },
            tags_inherited: r.keep_tags && !self.cur.tags.is_empty(),
            source: if r.keep_source {
                self.cur.source.clone()
            } else {
                None
            },
            source_inherited: r.keep_source && self.cur.source.is_some(),
            verb: self.cur.verb.clone(),
            params,
            closed: false,
        }
    }

    fn commit_continuation(&mut self, next: LineBuf) {
        let prev = std::mem::replace(&mut self.cur, next);
        self.queue.push(prev);
    }

    /// Append one parameter, splitting or overflowing onto continuation
    /// lines as needed.
    ///
    /// # Errors
    ///
    /// Fails before any state changes when the verb is missing, when a
    /// space-free parameter (or a single word of a splittable one) cannot
    /// fit even on a fresh line, or when retention leaves no parameter
    /// slot free.
    pub fn parameter(&mut self, text: &str) -> Result<(), BuildError> {
        if self.cur.verb.is_none() {
            return Err(BuildError::MissingVerb);
        }

        // Fast path: open line, free slot, fits whole.
        if !self.cur.closed
            && self.cur.params.len() < self.config.max_params
            && self.fits(&self.cur, text)
        {
            self.cur.push_param(text);
            return Ok(());
        }

        let template = self.continuation_template();
        if template.params.len() >= self.config.max_params {
            return Err(BuildError::TooManyParameters);
        }
        let template_budget = self
            .config
            .max_line_len
            .saturating_sub(self.line_len(&template) + 1);

        if !text.contains(' ') {
            // Unsplittable: either it fits alone on a fresh line or the
            // operation fails.
            if !self.fits(&template, text) {
                return Err(BuildError::UnsplittableParameter {
                    limit: self.config.max_line_len,
                });
            }
            self.commit_continuation(template);
            self.cur.push_param(text);
            return Ok(());
        }

        // Splittable: every word must individually fit a fresh line, so
        // the greedy placement below cannot fail halfway through.
        for word in text.split(' ') {
            let cost = word.len() + usize::from(needs_colon_marker(word));
            if cost > template_budget {
                return Err(BuildError::UnsplittableParameter {
                    limit: self.config.max_line_len,
                });
            }
        }

        let mut rest = text;
        let mut lines_opened = 0usize;
        loop {
            let open = !self.cur.closed && self.cur.params.len() < self.config.max_params;
            if open {
                let budget = self
                    .config
                    .max_line_len
                    .saturating_sub(self.line_len(&self.cur) + 1);
                if let Some((frag, rem)) = take_fragment(rest, budget) {
                    self.cur.push_param(frag);
                    match rem {
                        None => break,
                        Some(r) => {
                            rest = r;
                            self.commit_continuation(template.clone());
                            lines_opened += 1;
                            continue;
                        }
                    }
                }
            }
            self.commit_continuation(template.clone());
            lines_opened += 1;
        }
        if lines_opened > 0 {
            debug!(continuations = lines_opened, "split parameter across lines");
        }
        Ok(())
    }

    /// Close the current logical message and open the next one.
    ///
    /// The new message inherits source, tags and leading parameters per the
    /// retention policy; the verb must be set anew. Inherited source and
    /// tags cannot be set again.
    pub fn new_message(&mut self) -> Result<(), BuildError> {
        if self.cur.verb.is_none() {
            return Err(BuildError::MissingVerb);
        }
        let mut next = self.continuation_template();
        next.verb = None;
        self.commit_continuation(next);
        Ok(())
    }

    /// Finalize the session into a chain of one token per physical line.
    ///
    /// The factory is reset afterwards.
    pub fn construct_message(&mut self, pool: &mut TokenPool) -> Result<Box<Token>, BuildError> {
        if self.cur.verb.is_none() {
            return Err(BuildError::MissingVerb);
        }
        let mut lines = std::mem::take(&mut self.queue);
        lines.push(std::mem::take(&mut self.cur));

        let mut chain = Chain::new();
        for line in &lines {
            chain.push(render_line(&self.config, line, pool));
        }
        trace!(lines = lines.len(), "constructed message");
        match chain.into_head() {
            Some(head) => Ok(head),
            None => Err(BuildError::MissingVerb),
        }
    }
}

/// Largest prefix of `rest` ending at a word boundary whose serialized
/// cost fits `budget`.
///
/// `None` means nothing placeable here. A whole placement returns a `None`
/// remainder; a split returns `Some(rem)` with the boundary space dropped
/// (`rem` may be empty when the split lands on a trailing space, so the
/// caller still emits the final empty fragment and reconstruction keeps
/// that space).
fn take_fragment<'t>(rest: &'t str, budget: usize) -> Option<(&'t str, Option<&'t str>)> {
    fn cost(frag: &str) -> usize {
        frag.len() + usize::from(needs_colon_marker(frag))
    }
    if cost(rest) <= budget {
        return Some((rest, None));
    }
    let mut best = None;
    for (i, b) in rest.bytes().enumerate() {
        if b == b' ' {
            if cost(&rest[..i]) <= budget {
                best = Some(i);
            } else {
                break;
            }
        }
    }
    let i = best?;
    Some((&rest[..i], Some(&rest[i + 1..])))
}

/// Serialize one line and build its token decomposition over the same
/// backing bytes.
fn render_line(config: &FactoryConfig, line: &LineBuf, pool: &mut TokenPool) -> Box<Token> {
    type Range = (usize, usize);

    let mut buf: Vec<u8> = Vec::with_capacity(config.max_line_len);
    let mut tag_block: Option<Range> = None;
    let mut tag_parts: Vec<(Range, Range, Option<Range>)> = Vec::new();
    let mut source_range: Option<Range> = None;
    let mut verb_range: Option<Range> = None;
    let mut param_ranges: Vec<(Range, bool)> = Vec::new();

    if !line.tags.is_empty() {
        buf.push(b'@');
        let block_start = buf.len();
        for (i, (key, value)) in line.tags.iter().enumerate() {
            if i > 0 {
                buf.push(b';');
            }
            let tag_start = buf.len();
            buf.extend_from_slice(key.as_bytes());
            let key_range = (tag_start, buf.len());
            let value_range = value.as_ref().map(|v| {
                buf.push(b'=');
                let vstart = buf.len();
                buf.extend_from_slice(escape_tag_value(v).as_bytes());
                (vstart, buf.len())
            });
            tag_parts.push(((tag_start, buf.len()), key_range, value_range));
        }
        tag_block = Some((block_start, buf.len()));
        buf.push(b' ');
    }

    if let Some(source) = &line.source {
        buf.push(b':');
        let start = buf.len();
        buf.extend_from_slice(source.as_bytes());
        source_range = Some((start, buf.len()));
        buf.push(b' ');
    }

    if let Some(verb) = &line.verb {
        let start = buf.len();
        buf.extend_from_slice(verb.as_bytes());
        verb_range = Some((start, buf.len()));
    }

    let last = line.params.len().checked_sub(1);
    for (i, param) in line.params.iter().enumerate() {
        buf.push(b' ');
        let trailing = Some(i) == last && needs_colon_marker(param);
        if trailing {
            buf.push(b':');
        }
        let start = buf.len();
        buf.extend_from_slice(param.as_bytes());
        param_ranges.push(((start, buf.len()), trailing));
    }

    buf.extend_from_slice(b"\r\n");
    let bytes = Bytes::from(buf);
    let slice = |r: Range| -> Span {
        if r.0 == r.1 {
            Span::Empty
        } else {
            Span::One(bytes.slice(r.0..r.1))
        }
    };

    let mut kids = Chain::new();
    if let Some(block) = tag_block {
        let mut tags = Chain::new();
        for (whole, key, value) in &tag_parts {
            let mut parts = Chain::new();
            parts.push(pool.node_spanned(Symbol::TAG_KEY, slice(*key)));
            if let Some(v) = value {
                parts.push(pool.node_spanned(Symbol::TAG_VALUE, slice(*v)));
            }
            let head = parts
                .into_head()
                .map(|h| pool.node_with_child(Symbol::TAG, slice(*whole), h));
            if let Some(tag) = head {
                tags.push(tag);
            }
        }
        let list = match tags.into_head() {
            Some(h) => pool.node_with_child(Symbol::TAG_LIST, slice(block), h),
            None => pool.node_spanned(Symbol::TAG_LIST, slice(block)),
        };
        kids.push(list);
    }
    if let Some(r) = source_range {
        kids.push(pool.node_spanned(Symbol::SOURCE, slice(r)));
    }
    if let Some(r) = verb_range {
        kids.push(pool.node_spanned(Symbol::VERB, slice(r)));
    }
    for (r, trailing) in &param_ranges {
        let tag = if *trailing {
            Symbol::TRAILING
        } else {
            Symbol::MIDDLE
        };
        kids.push(pool.node_spanned(tag, slice(*r)));
    }

    let span = Span::One(bytes);
    match kids.into_head() {
        Some(head) => pool.node_with_child(Symbol::CONSTRUCTED, span, head),
        None => pool.node_spanned(Symbol::CONSTRUCTED, span),
    }
}
