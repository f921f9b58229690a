//! Primitive encode/decode helpers shared by every operation payload.
//!
//! These implement the payload primitives from `spec.md` §3: NUL-terminated
//! strings, fixed-width big-endian integers, and length-prefixed opaque
//! blobs. Every primitive here is infallible to *encode* (the caller already
//! owns well-formed data) and fallible to *decode* (the bytes come off the
//! wire).

use bytes::{BufMut, Bytes};

use crate::error::{ProtocolError, Result};

/// A cursor over an immutable byte slice, used only during decode.
///
/// Decoding never allocates beyond the input buffer; primitives here either
/// return a borrowed subslice or copy a handful of fixed bytes into a
/// stack-sized integer.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Wrap a buffer for sequential decoding.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes remaining after the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.buf.len()).ok_or(
            ProtocolError::OpaqueOverrun { declared: n as u32, available: self.remaining() },
        )?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read a NUL-terminated string (terminator consumed, not included).
    pub fn read_string(&mut self) -> Result<String> {
        let rest = &self.buf[self.pos..];
        let nul = rest.iter().position(|&b| b == 0).ok_or(ProtocolError::UnterminatedString)?;
        let text = &rest[..nul];
        let s = std::str::from_utf8(text).map_err(|_| ProtocolError::InvalidUtf8)?.to_owned();
        self.pos += nul + 1;
        Ok(s)
    }

    /// Read an opaque length-prefixed blob, returning a copy of its bytes.
    pub fn read_opaque(&mut self) -> Result<Bytes> {
        let len = self.read_u32()?;
        let data = self.take(len as usize).map_err(|_| ProtocolError::OpaqueOverrun {
            declared: len,
            available: self.remaining(),
        })?;
        Ok(Bytes::copy_from_slice(data))
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().unwrap_or_else(|_| unreachable!())))
    }

    /// Read a big-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Read a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        Ok(u64::from_be_bytes(bytes.try_into().unwrap_or_else(|_| unreachable!())))
    }

    /// Read a big-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    /// Assert the buffer is fully consumed; otherwise report trailing bytes.
    pub fn finish(self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(ProtocolError::TrailingBytes { extra: self.remaining() });
        }
        Ok(())
    }
}

/// Append a NUL-terminated string to `dst`.
pub fn put_string(dst: &mut impl BufMut, s: &str) {
    dst.put_slice(s.as_bytes());
    dst.put_u8(0);
}

/// Append an opaque length-prefixed blob to `dst`.
pub fn put_opaque(dst: &mut impl BufMut, data: &[u8]) {
    #[allow(clippy::expect_used)]
    let len = u32::try_from(data.len()).expect("opaque payloads are bounded well under u32::MAX");
    dst.put_u32(len);
    dst.put_slice(data);
}

/// Encoded length of a NUL-terminated string.
#[must_use]
pub fn string_len(s: &str) -> usize {
    s.len() + 1
}

/// Encoded length of an opaque blob (4-byte prefix plus data).
#[must_use]
pub fn opaque_len(data: &[u8]) -> usize {
    4 + data.len()
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    #[test]
    fn string_round_trip() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "hello");
        let mut r = Reader::new(&buf);
        assert_eq!(r.read_string().unwrap(), "hello");
        r.finish().unwrap();
    }

    #[test]
    fn empty_string_round_trip() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "");
        let mut r = Reader::new(&buf);
        assert_eq!(r.read_string().unwrap(), "");
    }

    #[test]
    fn opaque_round_trip_including_zero_length() {
        let mut buf = BytesMut::new();
        put_opaque(&mut buf, b"");
        put_opaque(&mut buf, b"payload");
        let mut r = Reader::new(&buf);
        assert_eq!(r.read_opaque().unwrap().as_ref(), b"");
        assert_eq!(r.read_opaque().unwrap().as_ref(), b"payload");
        r.finish().unwrap();
    }

    #[test]
    fn unterminated_string_is_rejected() {
        let buf = [b'a', b'b', b'c'];
        let mut r = Reader::new(&buf);
        assert_eq!(r.read_string(), Err(ProtocolError::UnterminatedString));
    }

    #[test]
    fn opaque_overrun_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32(100);
        buf.put_slice(b"short");
        let mut r = Reader::new(&buf);
        assert!(matches!(r.read_opaque(), Err(ProtocolError::OpaqueOverrun { .. })));
    }
}
