//! Rewriting protocol-relative paths into absolute local paths
//! (`spec.md` §4.2).
//!
//! Both the server (applying its own intercepted mutation) and the client
//! (replaying a decoded one) share this: concatenate a configured root
//! prefix with the relative path carried on the wire, and reject the result
//! if it would exceed the maximum rewritten-path length.

use std::path::{Path, PathBuf};

use crate::error::{FsError, Result};

/// Maximum length, in bytes, of a rewritten local path (`spec.md` §4.2).
pub const MAX_PATH_LEN: usize = 4096;

/// A configured root directory that relative wire paths resolve against.
#[derive(Debug, Clone)]
pub struct RootedPath {
    root: PathBuf,
}

impl RootedPath {
    /// Wrap a root directory. The root itself is not validated here; it is
    /// expected to already exist (checked once at startup by the caller).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative wire path to an absolute local path.
    ///
    /// `relative` is expected to already be a relative path (no leading
    /// `/`); a leading separator is stripped so `join` does not discard the
    /// root, matching the historical convention that wire paths carry a
    /// leading `/` denoting "root of the replicated tree", not the host's
    /// filesystem root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let trimmed = relative.trim_start_matches('/');
        let joined = self.root.join(trimmed);
        let len = joined.as_os_str().len();
        if len > MAX_PATH_LEN {
            return Err(FsError::PathOverflow { limit: MAX_PATH_LEN });
        }
        Ok(joined)
    }
}
