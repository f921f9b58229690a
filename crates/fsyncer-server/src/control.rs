//! The control loop (`spec.md` §4.6): services a single CONTROL-mode
//! connection, applying CORK/UNCORK commands to the shared [`CorkState`] and
//! acking each one.

use std::{
    io::{ErrorKind, Read, Write},
    net::TcpStream,
};

use fsyncer_proto::{command::COMMAND_SIZE, Ack, Command};
use tracing::{debug, info, warn};

use crate::cork::CorkState;

/// Drive one control connection until it disconnects or the transport
/// fails.
///
/// Per `spec.md` §4.6, an unrecognised command is not fatal to the
/// connection: it acks `-1` and the loop continues. Per `spec.md` §4.8,
/// transport failure on a control connection tears it down without
/// affecting data peers.
pub fn run(mut stream: TcpStream, cork: CorkState) {
    let peer = stream.peer_addr().map(|a| a.to_string()).unwrap_or_else(|_| "unknown".into());
    info!(peer, "control connection established");

    loop {
        let mut buf = [0u8; COMMAND_SIZE];
        match stream.read_exact(&mut buf) {
            Ok(()) => {},
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                info!(peer, "control connection closed");
                return;
            },
            Err(e) => {
                warn!(peer, error = %e, "control connection read failed");
                return;
            },
        }

        let retcode = match Command::decode(&buf) {
            Ok(Command::Cork) => {
                debug!(peer, "cork");
                if cork.is_corked() {
                    -1
                } else {
                    cork.cork();
                    0
                }
            },
            Ok(Command::Uncork) => {
                debug!(peer, "uncork");
                if cork.is_corked() {
                    cork.uncork();
                    0
                } else {
                    -1
                }
            },
            Err(e) => {
                debug!(peer, error = %e, "unrecognised control command");
                -1
            },
        };

        if let Err(e) = stream.write_all(&Ack { retcode }.encode()) {
            warn!(peer, error = %e, "failed to ack control command");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{net::TcpListener, thread};

    use super::*;

    #[test]
    fn cork_then_uncork_round_trip_acks_and_flips_state() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let cork = CorkState::new();
        let server_cork = cork.clone();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            run(stream, server_cork);
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(&Command::Cork.encode()).unwrap();
        let mut ack = [0u8; fsyncer_proto::ack::ACK_SIZE];
        client.read_exact(&mut ack).unwrap();
        assert_eq!(Ack::decode(&ack).unwrap(), Ack::ok());

        client.write_all(&Command::Uncork.encode()).unwrap();
        client.read_exact(&mut ack).unwrap();
        assert_eq!(Ack::decode(&ack).unwrap(), Ack::ok());

        drop(client);
        server.join().unwrap();
        assert!(!cork.is_corked());
    }
}
