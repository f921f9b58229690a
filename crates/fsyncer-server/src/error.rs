//! Server-side error types.

use thiserror::Error;

/// Errors from the server's accept path, control loop, or fan-out engine.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the configured listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that failed to bind.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A handshake could not be read or decoded.
    ///
    /// Per `spec.md` §7, this is not fatal to the server: the offending
    /// socket is closed silently and the accept loop continues.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The peer's declared digest did not match the server's own digest and
    /// `--dont-check` was not set (`SPEC_FULL.md` §4.5).
    #[error("digest mismatch: peer declared {peer:#x}, server computed {server:#x}")]
    DigestMismatch {
        /// Digest the peer declared at handshake.
        peer: u64,
        /// The server's own root digest.
        server: u64,
    },

    /// A transport operation on a live peer failed.
    ///
    /// Per `spec.md` §4.5/§4.8, this is not fatal to the server: the
    /// offending peer is removed and broadcast continues to the rest.
    #[error("transport error on peer {peer_id}: {source}")]
    Transport {
        /// The peer whose transport failed.
        peer_id: u64,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A SYNC peer did not ack within the configured timeout
    /// (`SPEC_FULL.md` §4.5).
    #[error("peer {peer_id} did not ack within {timeout_secs}s")]
    AckTimeout {
        /// The peer that timed out.
        peer_id: u64,
        /// The configured timeout.
        timeout_secs: u64,
    },

    /// A frame or control command failed to decode.
    #[error(transparent)]
    Protocol(#[from] fsyncer_proto::ProtocolError),

    /// The configured root directory is not usable.
    #[error("root directory error: {0}")]
    Root(#[from] fsyncer_fs::FsError),
}

impl ServerError {
    /// Whether this error should tear down the connection it occurred on
    /// (true for everything except digest mismatch, which is handled by
    /// simply never registering the peer).
    #[must_use]
    pub fn is_fatal_to_connection(&self) -> bool {
        !matches!(self, Self::Bind { .. })
    }
}
