//! Errors from the local filesystem adapter and path resolution.
//!
//! Every mutation in `spec.md` §4.2 reports failure as a negated platform
//! errno rather than a Rust error type on the wire (the ack frame is just an
//! `i32`). This type exists for the in-process boundary between
//! `fsyncer-fs` and its callers, and carries an `errno()` method that
//! recovers exactly that negated code.

use thiserror::Error;

/// Result alias used by the adapter and digest modules.
pub type Result<T> = std::result::Result<T, FsError>;

/// Errors from applying a mutation locally or resolving a path.
#[derive(Debug, Error)]
pub enum FsError {
    /// The underlying syscall failed; carries the raw `errno`.
    #[error("{operation} failed: {source}")]
    Syscall {
        /// Name of the operation that failed, for logging.
        operation: &'static str,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The rewritten absolute path exceeded the configured maximum length.
    ///
    /// Per `spec.md` §4.2 this is a client-local error for the single call,
    /// not a connection-ending one; it maps to `-EOVERFLOW` on the wire.
    #[error("resolved path exceeds the {limit}-byte limit")]
    PathOverflow {
        /// The configured limit.
        limit: usize,
    },

    /// `rename`'s `flags` argument was non-zero (`spec.md` §4.2: must be 0).
    #[error("rename flags must be 0, got {0:#x}")]
    RenameFlagsNotSupported(u32),

    /// `fallocate`'s `mode` argument was non-zero (`spec.md` §4.2: must be 0).
    #[error("fallocate mode must be 0, got {0:#x}")]
    FallocateModeNotSupported(u32),
}

impl FsError {
    /// The negated platform errno this error corresponds to on the wire.
    #[must_use]
    pub fn errno(&self) -> i32 {
        match self {
            Self::Syscall { source, .. } => {
                -source.raw_os_error().unwrap_or(libc::EIO)
            },
            Self::PathOverflow { .. } => -libc::EOVERFLOW,
            Self::RenameFlagsNotSupported(_) => -libc::EINVAL,
            Self::FallocateModeNotSupported(_) => -libc::EINVAL,
        }
    }

    /// Build a syscall error from the current `errno`.
    #[must_use]
    pub fn from_errno(operation: &'static str, err: nix::Error) -> Self {
        Self::Syscall { operation, source: std::io::Error::from_raw_os_error(err as i32) }
    }
}
