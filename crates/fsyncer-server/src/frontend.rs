//! The Server Front-End (`spec.md` §4.4): TCP listener, handshake, and
//! routing of new connections to the control loop or the fan-out engine's
//! peer table.

use std::net::{TcpListener, TcpStream};

use fsyncer_proto::{Handshake, PeerMode, HANDSHAKE_SIZE};
use socket2::Socket;
use tracing::{info, warn};

use crate::{control, fanout::FanoutEngine};

/// Send-buffer size set on every accepted data-peer socket (`spec.md`
/// §4.4's "generous send-buffer").
const PEER_SEND_BUFFER_BYTES: usize = 4 * 1024 * 1024;

/// Runs the accept loop until the listener errors out, spawning one thread
/// per connection. Never holds the fan-out engine's peer-table lock while
/// accepting (`spec.md` §4.4: "the accept path is never a fast path").
pub fn serve(
    listener: TcpListener,
    engine: FanoutEngine,
    check_digest: bool,
    consistent: bool,
    local_digest: u64,
) {
    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            },
        };
        let engine = engine.clone();
        std::thread::spawn(move || {
            handle_connection(stream, engine, check_digest, consistent, local_digest)
        });
    }
}

fn handle_connection(
    mut stream: TcpStream,
    engine: FanoutEngine,
    check_digest: bool,
    consistent: bool,
    local_digest: u64,
) {
    let peer = stream.peer_addr().map(|a| a.to_string()).unwrap_or_else(|_| "unknown".into());

    let mut handshake = match read_handshake(&mut stream) {
        Ok(h) => h,
        Err(e) => {
            warn!(peer, error = %e, "handshake failed, closing connection");
            return;
        },
    };
    if consistent && handshake.mode == PeerMode::Async {
        handshake.mode = PeerMode::Sync;
    }

    match handshake.mode {
        PeerMode::Control => {
            info!(peer, "routing to control loop");
            control::run(stream, engine.cork().clone());
        },
        PeerMode::Async | PeerMode::Sync => {
            if check_digest && handshake.digest != local_digest {
                warn!(
                    peer,
                    peer_digest = handshake.digest,
                    local_digest,
                    "digest mismatch, rejecting peer"
                );
                return;
            }

            if handshake.mode == PeerMode::Sync {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(peer, error = %e, "failed to disable Nagle for SYNC peer");
                }
            }
            if let Err(e) = set_send_buffer(&stream, PEER_SEND_BUFFER_BYTES) {
                warn!(peer, error = %e, "failed to size send buffer");
            }

            let id = engine.peers().lock().expect("peer table mutex poisoned").insert(
                handshake.mode,
                stream,
                handshake.digest,
            );
            info!(peer, peer_id = ?id, mode = ?handshake.mode, "peer registered");
        },
    }
}

fn read_handshake(stream: &mut TcpStream) -> std::io::Result<Handshake> {
    use std::io::Read;
    let mut buf = [0u8; HANDSHAKE_SIZE];
    stream.read_exact(&mut buf)?;
    Handshake::decode(&buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}

fn set_send_buffer(stream: &TcpStream, bytes: usize) -> std::io::Result<()> {
    // Operate on a duplicated fd so the `Socket` wrapper's `Drop` closes the
    // dup, not the stream's own fd.
    let socket = Socket::from(stream.try_clone()?);
    socket.set_send_buffer_size(bytes)
}
