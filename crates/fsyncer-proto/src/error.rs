//! Errors produced while encoding or decoding wire structures.
//!
//! Every variant here is a *protocol* error: something about the bytes
//! themselves is wrong, independent of what the decoded operation then does
//! locally. Callers treat all of these as fatal to the connection that
//! produced them (see `spec.md` §4.8).

use thiserror::Error;

/// Result alias used throughout the codec.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from frame/operation encoding and decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer was shorter than the 16-byte frame header.
    #[error("frame shorter than header: got {actual} bytes, need at least {expected}")]
    FrameTooShort {
        /// Minimum required length.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    /// The header declared a `length` smaller than the fixed header size.
    #[error("frame length {length} is smaller than the header size (16)")]
    LengthTooSmall {
        /// The declared length field.
        length: u32,
    },

    /// Fewer payload bytes were available than the header's `length` implied.
    #[error("frame truncated: expected {expected} payload bytes, got {actual}")]
    FrameTruncated {
        /// Payload bytes the header promised.
        expected: usize,
        /// Payload bytes actually present.
        actual: usize,
    },

    /// The payload contained more bytes than the op kind's template consumed.
    #[error("frame has {extra} trailing byte(s) past the decoded payload")]
    TrailingBytes {
        /// Bytes left over after decoding.
        extra: usize,
    },

    /// A string field was not NUL-terminated within the remaining buffer.
    #[error("unterminated string field")]
    UnterminatedString,

    /// A string field contained bytes that are not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// An opaque blob's declared length ran past the end of the buffer.
    #[error("opaque blob declares {declared} bytes but only {available} remain")]
    OpaqueOverrun {
        /// Length prefix read from the wire.
        declared: u32,
        /// Bytes actually remaining in the buffer.
        available: usize,
    },

    /// The 4-byte op kind discriminant did not match any known operation.
    #[error("unknown operation kind {0:#x}")]
    UnknownOpKind(u32),

    /// The 4-byte peer mode discriminant did not match ASYNC/SYNC/CONTROL.
    #[error("unknown peer mode {0:#x}")]
    UnknownPeerMode(u32),

    /// The 4-byte command discriminant did not match CORK/UNCORK.
    #[error("unknown command {0:#x}")]
    UnknownCommand(u32),

    /// A path field was empty, which the replay side rejects (`spec.md` §4.1).
    #[error("empty path in operation payload")]
    EmptyPath,
}
