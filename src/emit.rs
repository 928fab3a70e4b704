//! Byte emission for token chains.
//!
//! Emission is a walk over a chain's own spans: a parsed
//! [`Symbol::MESSAGE`] or constructed [`Symbol::CONSTRUCTED`] token already
//! carries the full line bytes, and children are sub-slices of the same
//! backing storage, so only the chain level is written. Parsed message
//! spans exclude their CRLF terminator; it is re-added here.

use std::io::{self, Write};

use crate::symbol::Symbol;
use crate::token::Token;

/// Encode protocol elements directly to a byte stream.
///
/// Writing to a caller-supplied [`Write`] avoids the intermediate `String`
/// that a `Display`-based path would allocate per message.
pub trait WireEncode {
    /// Encode this value to the given writer.
    ///
    /// Returns the number of bytes written on success.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the write fails.
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<usize>;

    /// Encode this value to a new `Vec<u8>`.
    #[must_use]
    fn to_wire_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(512);
        let _ = self.encode(&mut buf);
        buf
    }
}

impl WireEncode for Token {
    /// Write this token and its following siblings as physical lines.
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<usize> {
        let mut written = 0;
        for line in self.siblings() {
            for chunk in line.span().chunks() {
                written += writer.write(chunk)?;
            }
            if line.tag() == Symbol::MESSAGE {
                written += writer.write(b"\r\n")?;
            }
        }
        Ok(written)
    }
}
