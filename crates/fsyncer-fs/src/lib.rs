//! Local filesystem adapter, path resolution, metadata digest, and handle
//! cache shared by the server and client.
//!
//! This crate has no network awareness: it only knows how to apply a
//! mutation to a local directory and how to summarize a directory tree into
//! a digest.

pub mod adapter;
pub mod digest;
pub mod error;
pub mod handle_cache;
pub mod path;

pub use error::{FsError, Result};
pub use handle_cache::HandleCache;
pub use path::RootedPath;
