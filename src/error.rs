//! Error types for the grammar library.
//!
//! Three disjoint families: grammar failures ([`ParseError`]), strict escape
//! decoding failures ([`EscapeError`]), and factory validation failures
//! ([`BuildError`]). Parsing never panics; a malformed buffer surfaces as
//! diagnostics, not as a process failure.

use thiserror::Error;

/// A grammar production failed to match.
///
/// Internally this is the rewind-and-fail signal consumed by the calling
/// combinator; at a sub-grammar entry point it is the reported failure,
/// naming the production and the byte offset where matching stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{production}: expected {expected} at byte {offset}")]
pub struct ParseError {
    /// Name of the production that failed.
    pub production: &'static str,
    /// What the production was looking for.
    pub expected: &'static str,
    /// Absolute byte offset where matching stopped.
    pub offset: usize,
}

/// A strict escape sequence could not be decoded.
///
/// Only the ISUPPORT hex-triplet scheme reports errors; the tag-value scheme
/// repairs malformed input silently per the IRCv3 convention.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EscapeError {
    /// A backslash was not followed by `x` and two hex digits.
    #[error("malformed hex escape at byte {0}")]
    MalformedHex(usize),

    /// The decoded bytes were not valid UTF-8.
    #[error("escape sequence decodes to invalid utf-8")]
    InvalidUtf8,
}

/// A message-factory operation violated a construction constraint.
///
/// All variants are reported synchronously at the offending call, never
/// deferred to serialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// `source_prefix` was called twice on one message.
    #[error("source already set")]
    SourceAlreadySet,

    /// `source_prefix` was called on a message that inherited its source
    /// through the retention policy.
    #[error("source inherited from previous message")]
    SourceInherited,

    /// `verb` was called twice on one message.
    #[error("verb already set")]
    VerbAlreadySet,

    /// `tag` was called on a message that inherited its tag block through
    /// the retention policy.
    #[error("tag block inherited from previous message")]
    TagsInherited,

    /// The message has no verb at a point where one is required.
    #[error("message has no verb")]
    MissingVerb,

    /// The source cannot fit on a line even by itself.
    #[error("source too long: {len} bytes exceed line budget {limit}")]
    SourceTooLong {
        /// Serialized head length including markers and CRLF.
        len: usize,
        /// Configured line budget.
        limit: usize,
    },

    /// The verb (with whatever precedes it) cannot fit on a line.
    #[error("verb too long: {len} bytes exceed line budget {limit}")]
    VerbTooLong {
        /// Serialized head length including markers and CRLF.
        len: usize,
        /// Configured line budget.
        limit: usize,
    },

    /// The serialized tag block exceeds its independent budget. Not
    /// recoverable by splitting.
    #[error("tag block too long: {len} bytes exceed budget {limit}")]
    TagBudgetExceeded {
        /// Serialized tag block length including `@` and trailing space.
        len: usize,
        /// Configured tag budget.
        limit: usize,
    },

    /// A parameter (or one of its words) cannot fit even on a fresh line.
    #[error("parameter cannot be split to fit line budget {limit}")]
    UnsplittableParameter {
        /// Configured line budget.
        limit: usize,
    },

    /// The retention policy retains so many parameters that no new one can
    /// ever be placed.
    #[error("retained parameters leave no room for new ones")]
    TooManyParameters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ParseError {
            production: "channel",
            expected: "channel prefix",
            offset: 7,
        };
        assert_eq!(err.to_string(), "channel: expected channel prefix at byte 7");

        let err = BuildError::TagBudgetExceeded {
            len: 9000,
            limit: 8191,
        };
        assert_eq!(
            err.to_string(),
            "tag block too long: 9000 bytes exceed budget 8191"
        );

        let err = EscapeError::MalformedHex(3);
        assert_eq!(err.to_string(), "malformed hex escape at byte 3");
    }
}
