//! Rewindable cursor over segmented byte input.
//!
//! [`ByteCursor`] is the input abstraction the grammar consumes: a
//! position-tracking view over an ordered sequence of [`Bytes`] chunks with
//! single-byte peek/advance, O(1) checkpoint capture and restore, and
//! zero-copy extraction of consumed ranges as [`Span`]s.

use bytes::Bytes;

use crate::span::Span;

/// A saved cursor position.
///
/// Capturing and restoring is O(1); a checkpoint is only meaningful for the
/// cursor it was taken from, and only for rewinding (never fast-forwarding
/// past bytes the cursor has not visited).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    chunk: usize,
    offset: usize,
    consumed: usize,
}

impl Checkpoint {
    /// Absolute byte offset from the start of the input.
    pub fn position(&self) -> usize {
        self.consumed
    }
}

/// A rewindable view over a possibly-discontiguous byte sequence.
#[derive(Clone, Debug, Default)]
pub struct ByteCursor {
    chunks: Vec<Bytes>,
    chunk: usize,
    offset: usize,
    consumed: usize,
}

impl ByteCursor {
    /// An empty cursor; feed it with [`push_chunk`](Self::push_chunk).
    pub fn new() -> Self {
        Self::default()
    }

    /// A cursor over a single chunk.
    pub fn from_bytes(data: Bytes) -> Self {
        Self::from_chunks(vec![data])
    }

    /// A cursor over an ordered sequence of chunks.
    pub fn from_chunks(chunks: Vec<Bytes>) -> Self {
        let mut cur = ByteCursor {
            chunks,
            chunk: 0,
            offset: 0,
            consumed: 0,
        };
        cur.normalize();
        cur
    }

    /// Copy a plain slice into a single-chunk cursor.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self::from_bytes(Bytes::copy_from_slice(data))
    }

    /// Append a chunk of input, e.g. as more data arrives from a socket.
    pub fn push_chunk(&mut self, data: Bytes) {
        if !data.is_empty() {
            self.chunks.push(data);
        }
    }

    /// Skip exhausted and empty chunks so `chunk`/`offset` always point at a
    /// readable byte or one past the end.
    fn normalize(&mut self) {
        while self.chunk < self.chunks.len() && self.offset >= self.chunks[self.chunk].len() {
            self.chunk += 1;
            self.offset = 0;
        }
    }

    /// The next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.chunks.get(self.chunk).map(|c| c[self.offset])
    }

    /// Consume and return the next byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.offset += 1;
        self.consumed += 1;
        self.normalize();
        Some(b)
    }

    /// Absolute byte offset from the start of the input.
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        let mut n = 0;
        if let Some(c) = self.chunks.get(self.chunk) {
            n += c.len() - self.offset;
        }
        for c in &self.chunks[(self.chunk + 1).min(self.chunks.len())..] {
            n += c.len();
        }
        n
    }

    /// True when all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.chunk >= self.chunks.len()
    }

    /// Capture the current position.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            chunk: self.chunk,
            offset: self.offset,
            consumed: self.consumed,
        }
    }

    /// Restore a previously captured position.
    pub fn rewind(&mut self, cp: Checkpoint) {
        debug_assert!(cp.consumed <= self.consumed, "rewind must move backwards");
        self.chunk = cp.chunk;
        self.offset = cp.offset;
        self.consumed = cp.consumed;
    }

    /// Zero-copy view of the bytes between two checkpoints.
    pub fn span_between(&self, from: Checkpoint, to: Checkpoint) -> Span {
        debug_assert!(from.consumed <= to.consumed);
        if from.consumed == to.consumed {
            return Span::Empty;
        }
        if from.chunk == to.chunk {
            return Span::from(self.chunks[from.chunk].slice(from.offset..to.offset));
        }
        let mut parts = Vec::with_capacity(to.chunk - from.chunk + 1);
        parts.push(self.chunks[from.chunk].slice(from.offset..));
        for c in &self.chunks[from.chunk + 1..to.chunk.min(self.chunks.len())] {
            parts.push(c.clone());
        }
        if to.chunk < self.chunks.len() && to.offset > 0 {
            parts.push(self.chunks[to.chunk].slice(..to.offset));
        }
        Span::from_parts(parts)
    }

    /// Zero-copy view of the bytes consumed since `from`.
    pub fn span_since(&self, from: Checkpoint) -> Span {
        self.span_between(from, self.checkpoint())
    }
}
