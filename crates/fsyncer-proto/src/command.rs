//! Control-channel command frames (`spec.md` §3, §4.6): a single 4-byte
//! big-endian enum, no payload.

use bytes::{Buf, BufMut};

use crate::error::{ProtocolError, Result};

/// Size of an encoded command frame.
pub const COMMAND_SIZE: usize = 4;

/// A command sent on the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Command {
    /// Stall all fan-out until `Uncork`.
    Cork = 0,
    /// Resume fan-out, waking any blocked broadcasts.
    Uncork = 1,
}

impl Command {
    /// Encode to the fixed 4-byte wire form.
    #[must_use]
    pub fn encode(self) -> [u8; COMMAND_SIZE] {
        let mut buf = [0u8; COMMAND_SIZE];
        (&mut buf[..]).put_u32(self as u32);
        buf
    }

    /// Decode from exactly `COMMAND_SIZE` bytes.
    pub fn decode(mut bytes: &[u8]) -> Result<Self> {
        if bytes.len() < COMMAND_SIZE {
            return Err(ProtocolError::FrameTooShort { expected: COMMAND_SIZE, actual: bytes.len() });
        }
        match bytes.get_u32() {
            0 => Ok(Self::Cork),
            1 => Ok(Self::Uncork),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        assert_eq!(Command::decode(&Command::Cork.encode()).unwrap(), Command::Cork);
        assert_eq!(Command::decode(&Command::Uncork.encode()).unwrap(), Command::Uncork);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let bytes = 7u32.to_be_bytes();
        assert_eq!(Command::decode(&bytes), Err(ProtocolError::UnknownCommand(7)));
    }
}
