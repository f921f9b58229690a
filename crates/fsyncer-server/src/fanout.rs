//! The Fan-out Engine (`spec.md` §4.5): broadcasts one encoded mutation
//! frame to every registered data peer, in insertion order, blocking on the
//! cork barrier first and on each SYNC peer's ack in turn.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use fsyncer_proto::{Operation, PeerMode};
use tracing::{info, warn};

use crate::{cork::CorkState, peer::PeerTable};

/// Broadcasts mutations to the registered peer table.
///
/// Cloning a `FanoutEngine` shares the same peer table and cork state; it is
/// the handle every connection-handling thread holds.
#[derive(Clone)]
pub struct FanoutEngine {
    peers: Arc<Mutex<PeerTable>>,
    cork: CorkState,
    ack_timeout: Duration,
}

impl FanoutEngine {
    /// Build an engine over a fresh, empty peer table.
    #[must_use]
    pub fn new(cork: CorkState, ack_timeout: Duration) -> Self {
        Self { peers: Arc::new(Mutex::new(PeerTable::new())), cork, ack_timeout }
    }

    /// The shared peer table, for registration by the front-end.
    #[must_use]
    pub fn peers(&self) -> &Arc<Mutex<PeerTable>> {
        &self.peers
    }

    /// The shared cork state, for the control loop.
    #[must_use]
    pub fn cork(&self) -> &CorkState {
        &self.cork
    }

    /// Encode `op` once and deliver it to every live peer in insertion
    /// order.
    ///
    /// Per `spec.md` §4.5:
    /// - the broadcast blocks on the cork barrier before touching any peer;
    /// - a transport failure or ack timeout on one peer removes it from the
    ///   table and does not interrupt delivery to the rest;
    /// - a SYNC peer's ack blocks this call (and therefore every caller
    ///   driving mutations through this engine) until it arrives or times
    ///   out.
    pub fn broadcast(&self, tid: u64, op: &Operation) {
        self.cork.wait_while_corked();

        let frame = op.encode_frame(tid);
        let mut dead = Vec::new();
        let mut table = self.peers.lock().expect("peer table mutex poisoned");

        for peer in table.iter_mut() {
            if let Err(e) = peer.send(&frame) {
                warn!(peer_id = ?peer.id(), error = %e, "dropping peer after send failure");
                dead.push(peer.id());
                continue;
            }
            if peer.mode() == PeerMode::Sync {
                match peer.read_ack(self.ack_timeout) {
                    Ok(ack) => {
                        if ack.retcode < 0 {
                            warn!(peer_id = ?peer.id(), retcode = ack.retcode, "peer reported failure");
                        }
                    },
                    Err(e) => {
                        warn!(peer_id = ?peer.id(), error = %e, "dropping peer after missing ack");
                        dead.push(peer.id());
                    },
                }
            }
        }

        for id in dead {
            table.remove(id);
        }
    }

    /// Number of live peers, for diagnostics.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.lock().expect("peer table mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Read,
        net::{TcpListener, TcpStream},
        thread,
    };

    use fsyncer_proto::Operation;

    use super::*;

    fn connect(addr: std::net::SocketAddr) -> TcpStream {
        TcpStream::connect(addr).unwrap()
    }

    #[test]
    fn async_peers_receive_frames_in_order_without_blocking() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client_thread = thread::spawn(move || connect(addr));
        let (server_side, _) = listener.accept().unwrap();
        let client_side = client_thread.join().unwrap();

        let engine = FanoutEngine::new(CorkState::new(), Duration::from_secs(1));
        engine.peers().lock().unwrap().insert(PeerMode::Async, server_side, 0);

        let op = Operation::Mkdir { path: "/a".into(), mode: 0o755 };
        engine.broadcast(1, &op);

        let mut client_side = client_side;
        let mut header = [0u8; fsyncer_proto::HEADER_SIZE];
        client_side.read_exact(&mut header).unwrap();
        let frame_header = fsyncer_proto::FrameHeader::from_bytes(&header).unwrap();
        assert_eq!(frame_header.kind(), fsyncer_proto::OpKind::Mkdir.to_u32());
    }

    #[test]
    fn sync_peer_blocks_broadcast_until_ack_and_timeout_drops_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client_thread = thread::spawn(move || connect(addr));
        let (server_side, _) = listener.accept().unwrap();
        let _client_side = client_thread.join().unwrap();

        let engine = FanoutEngine::new(CorkState::new(), Duration::from_millis(50));
        let id = engine.peers().lock().unwrap().insert(PeerMode::Sync, server_side, 0);
        let _ = id;

        // Client never sends an ack, so the SYNC wait must time out and the
        // peer must be dropped rather than hanging forever.
        engine.broadcast(1, &Operation::Nop);
        assert_eq!(engine.peer_count(), 0);
    }

    #[test]
    fn cork_blocks_broadcast_until_uncorked() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client_thread = thread::spawn(move || connect(addr));
        let (server_side, _) = listener.accept().unwrap();
        let mut client_side = client_thread.join().unwrap();

        let cork = CorkState::new();
        cork.cork();
        let engine = FanoutEngine::new(cork.clone(), Duration::from_secs(1));
        engine.peers().lock().unwrap().insert(PeerMode::Async, server_side, 0);

        let engine_clone = engine.clone();
        let broadcaster = thread::spawn(move || engine_clone.broadcast(1, &Operation::Nop));

        thread::sleep(std::time::Duration::from_millis(20));
        assert!(!broadcaster.is_finished());

        cork.uncork();
        broadcaster.join().unwrap();

        let mut header = [0u8; fsyncer_proto::HEADER_SIZE];
        client_side.read_exact(&mut header).unwrap();
    }
}
