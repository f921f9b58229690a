//! Filesystem mutation replication server: accepts data and control
//! connections, applies intercepted mutations to a local directory tree,
//! and fans them out to every connected peer.
//!
//! This crate has no knowledge of *how* mutations are intercepted — that is
//! the Mutation Source boundary (`spec.md` §1 Non-goals) — only of what to
//! do with one once it arrives: apply it locally, then broadcast.

#![warn(missing_docs)]

pub mod config;
pub mod control;
pub mod cork;
pub mod error;
pub mod fanout;
pub mod frontend;
pub mod mutation_source;
pub mod peer;

pub use config::{ServerArgs, ServerConfig};
pub use cork::CorkState;
pub use error::ServerError;
pub use fanout::FanoutEngine;
pub use mutation_source::{MutationHandler, MutationSource};
pub use peer::{Peer, PeerId, PeerTable};
