//! Fixed 16-byte frame header, zero-copy parsed.
//!
//! Layout on the wire (`spec.md` §3), all fields big-endian:
//! `length: u32, kind: u32, tid: u64`. `length` counts the header itself, so
//! it is always `>= HEADER_SIZE`.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{ProtocolError, Result};

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Raw 16-byte frame header (big-endian fields, cast directly from the wire).
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    length: [u8; 4],
    kind: [u8; 4],
    tid: [u8; 8],
}

impl FrameHeader {
    /// Build a header for a payload of the given length and op kind.
    ///
    /// # Panics
    ///
    /// Panics if `payload_len + HEADER_SIZE` overflows `u32`; in practice
    /// payloads are bounded well below that by the opaque blob's own 4-byte
    /// length prefix already being a `u32`.
    #[must_use]
    pub fn new(kind: u32, tid: u64, payload_len: usize) -> Self {
        #[allow(clippy::expect_used)]
        let length = u32::try_from(payload_len + HEADER_SIZE)
            .expect("frame length fits in u32 (payload bounded by opaque-blob u32 prefix)");
        Self { length: length.to_be_bytes(), kind: kind.to_be_bytes(), tid: tid.to_be_bytes() }
    }

    /// Parse a header from the first 16 bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ProtocolError::FrameTooShort { expected: HEADER_SIZE, actual: bytes.len() });
        }
        #[allow(clippy::expect_used)]
        let header = Self::ref_from_prefix(bytes)
            .expect("length already validated above")
            .0
            .to_owned();
        if header.length() < HEADER_SIZE as u32 {
            return Err(ProtocolError::LengthTooSmall { length: header.length() });
        }
        Ok(header)
    }

    /// Serialize to the 16-byte wire form.
    #[must_use]
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let bytes = IntoBytes::as_bytes(&self);
        let mut arr = [0u8; HEADER_SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Total frame length including this header.
    #[must_use]
    pub fn length(&self) -> u32 {
        u32::from_be_bytes(self.length)
    }

    /// Raw operation-kind discriminant.
    #[must_use]
    pub fn kind(&self) -> u32 {
        u32::from_be_bytes(self.kind)
    }

    /// Transaction id (0 if unused).
    #[must_use]
    pub fn tid(&self) -> u64 {
        u64::from_be_bytes(self.tid)
    }

    /// Payload length implied by `length - HEADER_SIZE`.
    #[must_use]
    pub fn payload_len(&self) -> u32 {
        self.length() - HEADER_SIZE as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let h = FrameHeader::new(7, 42, 100);
        let bytes = h.to_bytes();
        let parsed = FrameHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.length(), 116);
        assert_eq!(parsed.kind(), 7);
        assert_eq!(parsed.tid(), 42);
        assert_eq!(parsed.payload_len(), 100);
    }

    #[test]
    fn rejects_length_below_header_size() {
        let mut bytes = FrameHeader::new(0, 0, 0).to_bytes();
        bytes[0..4].copy_from_slice(&4u32.to_be_bytes());
        assert_eq!(FrameHeader::from_bytes(&bytes), Err(ProtocolError::LengthTooSmall { length: 4 }));
    }

    #[test]
    fn rejects_short_buffer() {
        assert_eq!(
            FrameHeader::from_bytes(&[0u8; 10]),
            Err(ProtocolError::FrameTooShort { expected: 16, actual: 10 })
        );
    }
}
