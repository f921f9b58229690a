//! The Client Replay Engine (`spec.md` §4.7): connect, handshake, read the
//! server's frame stream, decode, rewrite paths against the configured
//! destination root, apply locally, and ack in SYNC mode.

use std::{
    io::{Read, Write},
    net::TcpStream,
    sync::Mutex,
};

use fsyncer_fs::{adapter, HandleCache, RootedPath};
use fsyncer_proto::{Ack, FrameHeader, Handshake, Operation, PeerMode, HEADER_SIZE};
use socket2::Socket;
use tracing::{debug, info, warn};

use crate::error::ClientError;

/// Receive-buffer size set on the connection right after it is opened
/// (`spec.md` §4.7's "sets a large receive buffer").
const RECV_BUFFER_BYTES: usize = 4 * 1024 * 1024;

/// Opens a TCP connection to `host:port`, sizes its receive buffer, and
/// sends the handshake record declaring `mode` and `digest`. In SYNC mode,
/// Nagle's algorithm is disabled, symmetric to the server's SYNC peers.
pub fn connect(host: &str, port: u16, mode: PeerMode, digest: u64) -> Result<TcpStream, ClientError> {
    let addr = format!("{host}:{port}");
    let mut stream =
        TcpStream::connect(&addr).map_err(|source| ClientError::Connect { addr, source })?;

    if let Err(e) = set_recv_buffer(&stream, RECV_BUFFER_BYTES) {
        warn!(error = %e, "failed to size receive buffer");
    }
    if mode == PeerMode::Sync {
        stream.set_nodelay(true)?;
    }

    stream.write_all(&Handshake { mode, digest }.encode())?;
    info!(server = %stream.peer_addr().map(|a| a.to_string()).unwrap_or_default(), ?mode, "connected and handshaked");

    Ok(stream)
}

/// Runs the replay loop until the connection closes or a fatal protocol
/// error occurs (`spec.md` §4.7/§4.8). Strictly sequential: one frame is
/// fully applied (and, in SYNC mode, acked) before the next is read.
pub fn run(mut stream: TcpStream, dest: RootedPath, sync: bool) -> Result<(), ClientError> {
    let handles = Mutex::new(HandleCache::default());

    loop {
        let mut header_buf = [0u8; HEADER_SIZE];
        match stream.read_exact(&mut header_buf) {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                info!("server closed the connection");
                return Ok(());
            },
            Err(e) => return Err(e.into()),
        }
        let header = FrameHeader::from_bytes(&header_buf)?;

        let mut payload = vec![0u8; header.payload_len() as usize];
        stream.read_exact(&mut payload)?;

        let mut frame = header_buf.to_vec();
        frame.extend_from_slice(&payload);
        let (tid, op) = Operation::decode_frame(&frame)?;

        debug!(tid, op = ?op, "replaying operation");
        let retcode = apply_locally(&dest, &handles, &op);
        if retcode < 0 {
            warn!(tid, op = ?op, retcode, "local replay failed, continuing (spec.md §4.7 partial-failure policy)");
        }

        if sync {
            stream.write_all(&Ack { retcode }.encode())?;
        }
    }
}

/// Rewrite `op`'s paths against `dest` and apply it via the Local FS
/// Adapter, returning the POSIX-style return code. An exhaustive match,
/// symmetric to the server's `MutationHandler::apply_locally`.
fn apply_locally(dest: &RootedPath, handles: &Mutex<HandleCache>, op: &Operation) -> i32 {
    let mut handles = handles.lock().expect("handle cache mutex poisoned");
    match op {
        Operation::Mknod { path, mode, rdev } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            adapter::mknod(&p, *mode, *rdev)
        },
        Operation::Mkdir { path, mode } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            adapter::mkdir(&p, *mode)
        },
        Operation::Unlink { path } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            handles.evict(path);
            adapter::unlink(&p)
        },
        Operation::Rmdir { path } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            handles.evict(path);
            adapter::rmdir(&p)
        },
        Operation::Symlink { from, to } => {
            let Ok(p) = dest.resolve(to) else { return -libc::EOVERFLOW };
            adapter::symlink(from, &p)
        },
        Operation::Rename { from, to, flags } => {
            let (Ok(f), Ok(t)) = (dest.resolve(from), dest.resolve(to)) else {
                return -libc::EOVERFLOW;
            };
            handles.evict(from);
            handles.evict(to);
            adapter::rename(&f, &t, *flags)
        },
        Operation::Link { from, to } => {
            let (Ok(f), Ok(t)) = (dest.resolve(from), dest.resolve(to)) else {
                return -libc::EOVERFLOW;
            };
            adapter::link(&f, &t)
        },
        Operation::Chmod { path, mode } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            adapter::chmod(&p, *mode)
        },
        Operation::Chown { path, uid, gid } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            adapter::chown(&p, *uid, *gid)
        },
        Operation::Truncate { path, size } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            adapter::truncate(&p, *size)
        },
        Operation::Write { path, data, offset } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            adapter::write(&p, data, *offset)
        },
        Operation::Create { path, mode, flags } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            let (rc, file) = adapter::create(&p, *mode, *flags);
            if let Some(file) = file {
                handles.insert(path.clone(), file);
            }
            rc
        },
        Operation::Utimens { path, atime, mtime } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            adapter::utimens(&p, (atime.sec, atime.nsec), (mtime.sec, mtime.nsec))
        },
        Operation::Fallocate { path, mode, offset, length } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            adapter::fallocate(&p, *mode, *offset, *length)
        },
        Operation::Setxattr { path, name, value, flags } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            adapter::setxattr(&p, name, value, *flags)
        },
        Operation::Removexattr { path, name } => {
            let Ok(p) = dest.resolve(path) else { return -libc::EOVERFLOW };
            adapter::removexattr(&p, name)
        },
        Operation::Nop => 0,
    }
}

fn set_recv_buffer(stream: &TcpStream, bytes: usize) -> std::io::Result<()> {
    // Operate on a duplicated fd so the `Socket` wrapper's `Drop` closes the
    // dup, not the stream's own fd.
    let socket = Socket::from(stream.try_clone()?);
    socket.set_recv_buffer_size(bytes)
}

#[cfg(test)]
mod tests {
    use std::{net::TcpListener, thread};

    use fsyncer_proto::Operation;
    use tempfile::tempdir;

    use super::*;

    fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let connector = thread::spawn(move || TcpStream::connect(addr).unwrap());
        let (server_side, _) = listener.accept().unwrap();
        (server_side, connector.join().unwrap())
    }

    #[test]
    fn async_replay_applies_mkdir_without_acking() {
        let dir = tempdir().unwrap();
        let (mut server, client) = loopback_pair();

        let replay = thread::spawn(move || {
            run(client, RootedPath::new(dir.path().to_path_buf()), false).unwrap();
        });

        let op = Operation::Mkdir { path: "/sub".into(), mode: 0o755 };
        server.write_all(&op.encode_frame(1)).unwrap();
        drop(server);
        replay.join().unwrap();
    }

    #[test]
    fn sync_replay_acks_each_applied_frame() {
        let dir = tempdir().unwrap();
        let dest = dir.path().to_path_buf();
        let (mut server, client) = loopback_pair();

        let replay = thread::spawn(move || {
            run(client, RootedPath::new(dest), true).unwrap();
        });

        let op = Operation::Mkdir { path: "/sub".into(), mode: 0o755 };
        server.write_all(&op.encode_frame(1)).unwrap();

        let mut ack_buf = [0u8; fsyncer_proto::ack::ACK_SIZE];
        server.read_exact(&mut ack_buf).unwrap();
        assert_eq!(Ack::decode(&ack_buf).unwrap(), Ack::ok());

        drop(server);
        replay.join().unwrap();
    }

    #[test]
    fn a_failing_local_op_is_not_fatal_and_the_loop_continues() {
        let dir = tempdir().unwrap();
        let dest = dir.path().to_path_buf();
        let (mut server, client) = loopback_pair();

        let replay = thread::spawn(move || {
            run(client, RootedPath::new(dest), true).unwrap();
        });

        // unlink of a path that was never created fails locally, but the
        // connection must stay up for the next frame.
        server.write_all(&Operation::Unlink { path: "/missing".into() }.encode_frame(1)).unwrap();
        let mut ack_buf = [0u8; fsyncer_proto::ack::ACK_SIZE];
        server.read_exact(&mut ack_buf).unwrap();
        assert!(Ack::decode(&ack_buf).unwrap().retcode < 0);

        server.write_all(&Operation::Mkdir { path: "/ok".into(), mode: 0o755 }.encode_frame(2)).unwrap();
        server.read_exact(&mut ack_buf).unwrap();
        assert_eq!(Ack::decode(&ack_buf).unwrap(), Ack::ok());

        drop(server);
        replay.join().unwrap();
    }

    #[test]
    fn malformed_frame_terminates_the_connection() {
        let dir = tempdir().unwrap();
        let (mut server, client) = loopback_pair();

        // A header declaring an op kind that doesn't exist.
        let header = FrameHeader::new(0xffff_ffff, 0, 0);
        server.write_all(&header.to_bytes()).unwrap();
        drop(server);

        let result = run(client, RootedPath::new(dir.path().to_path_buf()), false);
        assert!(matches!(result, Err(ClientError::Protocol(_))));
    }
}
