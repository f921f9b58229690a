//! Ack frames (`spec.md` §3): a single signed 4-byte big-endian `retcode`.
//! Sent peer → server on the data channel in SYNC mode, and server → control
//! peer in response to a command.

use bytes::{Buf, BufMut};

use crate::error::{ProtocolError, Result};

/// Size of an encoded ack frame.
pub const ACK_SIZE: usize = 4;

/// An acknowledgement carrying a POSIX-style return code: `0` or positive is
/// success (positive carries a byte count for `WRITE`), negative is
/// `-errno`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// The return code.
    pub retcode: i32,
}

impl Ack {
    /// Build a success ack with `retcode = 0`.
    #[must_use]
    pub fn ok() -> Self {
        Self { retcode: 0 }
    }

    /// Encode to the fixed 4-byte wire form.
    #[must_use]
    pub fn encode(self) -> [u8; ACK_SIZE] {
        let mut buf = [0u8; ACK_SIZE];
        (&mut buf[..]).put_i32(self.retcode);
        buf
    }

    /// Decode from exactly `ACK_SIZE` bytes.
    pub fn decode(mut bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ACK_SIZE {
            return Err(ProtocolError::FrameTooShort { expected: ACK_SIZE, actual: bytes.len() });
        }
        Ok(Self { retcode: bytes.get_i32() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_negative_and_positive() {
        for retcode in [-22, 0, 5, i32::MIN, i32::MAX] {
            let ack = Ack { retcode };
            assert_eq!(Ack::decode(&ack.encode()).unwrap(), ack);
        }
    }
}
