//! The peer record and peer table (`spec.md` §3).
//!
//! Per `spec.md` §9's design note, this is an index/handle-based table, not
//! a linked list with back-pointers: the table owns a plain `Vec<Peer>` and
//! hands out opaque [`PeerId`]s, so removal-during-iteration never needs a
//! prev-pointer dance.

use std::{
    io::{self, Write},
    net::TcpStream,
    time::Duration,
};

use fsyncer_proto::PeerMode;

/// Opaque, monotonically increasing identifier for a connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(u64);

/// A single connected data peer (ASYNC or SYNC; CONTROL peers never reach
/// the peer table — they are handled by the dedicated control loop).
pub struct Peer {
    id: PeerId,
    mode: PeerMode,
    stream: TcpStream,
    /// The peer's declared startup digest, kept for diagnostics/logging.
    digest: u64,
}

impl Peer {
    fn new(id: PeerId, mode: PeerMode, stream: TcpStream, digest: u64) -> Self {
        Self { id, mode, stream, digest }
    }

    /// This peer's id.
    #[must_use]
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// This peer's declared mode.
    #[must_use]
    pub fn mode(&self) -> PeerMode {
        self.mode
    }

    /// This peer's declared startup digest.
    #[must_use]
    pub fn digest(&self) -> u64 {
        self.digest
    }

    /// Write the entire frame to this peer, looping over partial writes.
    ///
    /// Per `spec.md` §4.5, a transport failure here is reported to the
    /// caller so the peer can be removed; it never panics.
    pub fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.stream.write_all(frame)
    }

    /// Read one ack frame from this peer with the given timeout, used by
    /// SYNC fan-out (`spec.md` §4.5, §9 ack-timeout resolution).
    pub fn read_ack(&mut self, timeout: Duration) -> io::Result<fsyncer_proto::Ack> {
        self.stream.set_read_timeout(Some(timeout))?;
        let mut buf = [0u8; fsyncer_proto::ack::ACK_SIZE];
        read_exact_or_eof(&mut self.stream, &mut buf)?;
        fsyncer_proto::Ack::decode(&buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }
}

fn read_exact_or_eof(stream: &mut TcpStream, buf: &mut [u8]) -> io::Result<()> {
    use std::io::Read;
    stream.read_exact(buf)
}

/// Insertion-ordered table of live data peers.
#[derive(Default)]
pub struct PeerTable {
    next_id: u64,
    peers: Vec<Peer>,
}

impl PeerTable {
    /// Build an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 0, peers: Vec::new() }
    }

    /// Register a newly handshaken peer, returning its id.
    pub fn insert(&mut self, mode: PeerMode, stream: TcpStream, digest: u64) -> PeerId {
        let id = PeerId(self.next_id);
        self.next_id += 1;
        self.peers.push(Peer::new(id, mode, stream, digest));
        id
    }

    /// Remove a peer by id, closing its transport (via `Drop`).
    ///
    /// Per `spec.md` §3, removal must not interrupt delivery to sibling
    /// peers: this only mutates the `Vec`, it never touches other entries.
    pub fn remove(&mut self, id: PeerId) {
        self.peers.retain(|p| p.id != id);
    }

    /// Iterate over live peers in insertion order (mutable, for fan-out).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Peer> {
        self.peers.iter_mut()
    }

    /// Number of live peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn insertion_order_is_preserved_across_removal() {
        let mut table = PeerTable::new();
        let (a, _a_keepalive) = loopback_pair();
        let (b, _b_keepalive) = loopback_pair();
        let (c, _c_keepalive) = loopback_pair();
        let id_a = table.insert(PeerMode::Async, a, 0);
        let id_b = table.insert(PeerMode::Async, b, 0);
        let _id_c = table.insert(PeerMode::Async, c, 0);

        table.remove(id_b);
        let ids: Vec<u64> = table.iter_mut().map(|p| p.id().0).collect();
        assert_eq!(ids, vec![id_a.0, _id_c.0]);
    }
}
