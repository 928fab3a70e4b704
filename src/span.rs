//! Zero-copy byte ranges over segmented input.
//!
//! Input arrives as one or more [`Bytes`] chunks. A span that falls inside a
//! single chunk borrows it without copying; a range crossing a chunk boundary
//! keeps one handle per crossed chunk and is only concatenated when the
//! caller asks for contiguous bytes.

use bytes::Bytes;

/// A byte range into the original input.
///
/// Equality is by content, so a range held as one chunk compares equal to the
/// same bytes held as several.
#[derive(Clone, Debug, Default)]
pub enum Span {
    /// No bytes.
    #[default]
    Empty,
    /// A range inside a single chunk.
    One(Bytes),
    /// A range crossing chunk boundaries, in input order.
    Many(Vec<Bytes>),
}

impl Span {
    /// Build a span from chunk slices, collapsing the trivial shapes.
    pub fn from_parts(mut parts: Vec<Bytes>) -> Self {
        parts.retain(|p| !p.is_empty());
        match parts.len() {
            0 => Span::Empty,
            1 => Span::One(parts.remove(0)),
            _ => Span::Many(parts),
        }
    }

    /// Copy a plain slice into a single-chunk span.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        if data.is_empty() {
            Span::Empty
        } else {
            Span::One(Bytes::copy_from_slice(data))
        }
    }

    /// The underlying chunk handles, in order.
    pub fn chunks(&self) -> &[Bytes] {
        match self {
            Span::Empty => &[],
            Span::One(b) => std::slice::from_ref(b),
            Span::Many(v) => v,
        }
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.chunks().iter().map(Bytes::len).sum()
    }

    /// True when the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        matches!(self, Span::Empty)
    }

    /// First byte, if any.
    pub fn first(&self) -> Option<u8> {
        self.chunks().first().map(|c| c[0])
    }

    /// Contiguous view, available when the span lies in one chunk.
    pub fn as_contiguous(&self) -> Option<&[u8]> {
        match self {
            Span::Empty => Some(&[]),
            Span::One(b) => Some(b),
            Span::Many(_) => None,
        }
    }

    /// Materialize as a single [`Bytes`].
    ///
    /// Free for [`Span::Empty`] and [`Span::One`]; copies once for
    /// [`Span::Many`].
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Span::Empty => Bytes::new(),
            Span::One(b) => b.clone(),
            Span::Many(parts) => {
                let mut buf = Vec::with_capacity(self.len());
                for p in parts {
                    buf.extend_from_slice(p);
                }
                Bytes::from(buf)
            }
        }
    }

    /// Append the span's bytes to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        for p in self.chunks() {
            out.extend_from_slice(p);
        }
    }

    /// Iterate over the span's bytes.
    pub fn iter_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.chunks().iter().flat_map(|c| c.iter().copied())
    }

    /// Decode as UTF-8, replacing invalid sequences.
    pub fn to_text_lossy(&self) -> String {
        match self.as_contiguous() {
            Some(s) => String::from_utf8_lossy(s).into_owned(),
            None => String::from_utf8_lossy(&self.to_bytes()).into_owned(),
        }
    }
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter_bytes().eq(other.iter_bytes())
    }
}

impl Eq for Span {}

impl PartialEq<[u8]> for Span {
    fn eq(&self, other: &[u8]) -> bool {
        self.len() == other.len() && self.iter_bytes().eq(other.iter().copied())
    }
}

impl PartialEq<&[u8]> for Span {
    fn eq(&self, other: &&[u8]) -> bool {
        self == *other
    }
}

impl From<Bytes> for Span {
    fn from(b: Bytes) -> Self {
        if b.is_empty() {
            Span::Empty
        } else {
            Span::One(b)
        }
    }
}
