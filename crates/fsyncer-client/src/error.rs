//! Client-side error types.

use thiserror::Error;

/// Errors from the client's connect/handshake/replay path.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to connect to the configured server address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// The address that was dialed.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A transport read or write failed mid-replay.
    ///
    /// Per `spec.md` §4.8, a short read on a closing transport terminates
    /// the client connection.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// A frame failed to decode, or an unrecognised op kind was seen.
    ///
    /// Per `spec.md` §4.7/§4.8, this is always fatal to the connection.
    #[error(transparent)]
    Protocol(#[from] fsyncer_proto::ProtocolError),

    /// The configured destination root is not usable.
    #[error("destination root error: {0}")]
    Root(#[from] fsyncer_fs::FsError),
}
