//! The handshake record exchanged when a peer first connects (`spec.md` §3,
//! §6): `mode: u32, destination digest: u64`, both big-endian, 12 bytes
//! total. Sent client → server on both the data and control channels.

use bytes::{Buf, BufMut};

use crate::error::{ProtocolError, Result};

/// Fixed size of an encoded handshake record.
pub const HANDSHAKE_SIZE: usize = 12;

/// The peer mode declared at handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PeerMode {
    /// Fire-and-forget: frames are fanned out without waiting for an ack.
    Async = 0,
    /// Durable: the fan-out engine waits for this peer's ack before
    /// proceeding to the next peer.
    Sync = 1,
    /// Control channel: carries CORK/UNCORK commands, not mutations.
    Control = 2,
}

impl PeerMode {
    #[must_use]
    fn to_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for PeerMode {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Async),
            1 => Ok(Self::Sync),
            2 => Ok(Self::Control),
            other => Err(ProtocolError::UnknownPeerMode(other)),
        }
    }
}

/// A handshake record: declared mode plus the sender's startup digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    /// Requested peer mode.
    pub mode: PeerMode,
    /// The sender's `spec.md` §4.3 Metadata Digest, informational unless
    /// digest gating is enabled server-side (`SPEC_FULL.md` §4.5).
    pub digest: u64,
}

impl Handshake {
    /// Encode to the fixed 12-byte wire form.
    #[must_use]
    pub fn encode(self) -> [u8; HANDSHAKE_SIZE] {
        let mut buf = [0u8; HANDSHAKE_SIZE];
        let mut w = &mut buf[..];
        w.put_u32(self.mode.to_u32());
        w.put_u64(self.digest);
        buf
    }

    /// Decode from exactly `HANDSHAKE_SIZE` bytes.
    pub fn decode(mut bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HANDSHAKE_SIZE {
            return Err(ProtocolError::FrameTooShort { expected: HANDSHAKE_SIZE, actual: bytes.len() });
        }
        let mode = PeerMode::try_from(bytes.get_u32())?;
        let digest = bytes.get_u64();
        Ok(Self { mode, digest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_mode() {
        for mode in [PeerMode::Async, PeerMode::Sync, PeerMode::Control] {
            let hs = Handshake { mode, digest: 0xdead_beef_u64 };
            let bytes = hs.encode();
            assert_eq!(Handshake::decode(&bytes).unwrap(), hs);
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let mut bytes = [0u8; HANDSHAKE_SIZE];
        bytes[0..4].copy_from_slice(&99u32.to_be_bytes());
        assert_eq!(Handshake::decode(&bytes), Err(ProtocolError::UnknownPeerMode(99)));
    }
}
