//! Wire codec for the filesystem mutation replication protocol.
//!
//! This crate has no I/O and no async dependency: it only knows how to turn
//! an [`Operation`] into bytes and back, plus the small fixed-size framing
//! structures (handshake, command, ack) used around it. `fsyncer-server` and
//! `fsyncer-client` both depend on it and own the actual socket I/O.

pub mod ack;
pub mod codec;
pub mod command;
pub mod error;
pub mod handshake;
pub mod header;
pub mod opcode;
pub mod operation;

pub use ack::Ack;
pub use command::Command;
pub use error::{ProtocolError, Result};
pub use handshake::{Handshake, PeerMode};
pub use header::{FrameHeader, HEADER_SIZE};
pub use opcode::OpKind;
pub use operation::{Operation, Timespec};
