//! Integration tests driving the fan-out engine over real loopback sockets
//! (`SPEC_FULL.md` §8), rather than unit tests internal to `fanout.rs`.

use std::{
    io::Read,
    net::{TcpListener, TcpStream},
    thread,
    time::Duration,
};

use fsyncer_proto::{FrameHeader, Operation, PeerMode, HEADER_SIZE};
use fsyncer_server::{CorkState, FanoutEngine};

fn loopback_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let connector = thread::spawn(move || TcpStream::connect(addr).unwrap());
    let (server_side, _) = listener.accept().unwrap();
    (server_side, connector.join().unwrap())
}

fn read_one_frame(stream: &mut TcpStream) -> (u64, Operation) {
    let mut header_buf = [0u8; HEADER_SIZE];
    stream.read_exact(&mut header_buf).unwrap();
    let header = FrameHeader::from_bytes(&header_buf).unwrap();
    let mut payload = vec![0u8; header.payload_len() as usize];
    stream.read_exact(&mut payload).unwrap();
    let mut frame = header_buf.to_vec();
    frame.extend_from_slice(&payload);
    Operation::decode_frame(&frame).unwrap()
}

#[test]
fn a_peer_failure_does_not_interrupt_delivery_to_its_siblings() {
    let (server_a, mut client_a) = loopback_pair();
    let (server_b, mut client_b) = loopback_pair();

    let engine = FanoutEngine::new(CorkState::new(), Duration::from_secs(1));
    engine.peers().lock().unwrap().insert(PeerMode::Async, server_a, 0);
    engine.peers().lock().unwrap().insert(PeerMode::Async, server_b, 0);

    // Sever peer A's transport before the broadcast, so its write fails.
    drop(client_a);

    engine.broadcast(1, &Operation::Mkdir { path: "/x".into(), mode: 0o755 });

    // Peer B must still have received the frame, and the dead peer A must
    // have been dropped from the table.
    let (_tid, op) = read_one_frame(&mut client_b);
    assert_eq!(op, Operation::Mkdir { path: "/x".into(), mode: 0o755 });
    assert_eq!(engine.peer_count(), 1);
}

#[test]
fn ordering_is_preserved_within_a_single_peer() {
    let (server, mut client) = loopback_pair();
    let engine = FanoutEngine::new(CorkState::new(), Duration::from_secs(1));
    engine.peers().lock().unwrap().insert(PeerMode::Async, server, 0);

    let ops = vec![
        Operation::Mkdir { path: "/a".into(), mode: 0o755 },
        Operation::Unlink { path: "/a/b".into() },
        Operation::Nop,
    ];
    for (i, op) in ops.iter().enumerate() {
        engine.broadcast(i as u64, op);
    }

    for (i, expected) in ops.iter().enumerate() {
        let (tid, op) = read_one_frame(&mut client);
        assert_eq!(tid, i as u64);
        assert_eq!(&op, expected);
    }
}
