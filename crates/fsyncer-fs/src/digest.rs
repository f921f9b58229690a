//! Metadata Digest (`spec.md` §4.3): a pre-order walk of a directory tree
//! that never follows symlinks, folding `(relative path, size, mtime)` into
//! a single 64-bit rolling hash.
//!
//! Used once by the client at startup (sent in the handshake) and, per
//! `SPEC_FULL.md` §4.5, by the server at startup for handshake digest
//! gating. Also exposed as the standalone `fscompare` binary.

use std::{
    fs,
    os::unix::fs::MetadataExt,
    path::{Path, PathBuf},
};

use crate::error::{FsError, Result};

const SEED: u64 = 5381;

fn fold_byte(hash: u64, byte: u8) -> u64 {
    hash.wrapping_mul(33).wrapping_add(u64::from(byte))
}

fn fold_bytes(hash: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(hash, |h, &b| fold_byte(h, b))
}

fn fold_i64(hash: u64, value: i64) -> u64 {
    fold_bytes(hash, &value.to_ne_bytes())
}

/// Walk `root` in pre-order and fold every entry's relative path, size, and
/// modification time into a single 64-bit digest. Entries are visited in
/// sorted-by-name order within each directory so the result does not depend
/// on the OS's `readdir` yield order. Symlinks are folded using their own
/// (`symlink_metadata`) attributes and never traversed through.
pub fn scan(root: &Path) -> Result<u64> {
    let mut hash = SEED;
    fold_dir(root, root, &mut hash)?;
    Ok(hash)
}

fn fold_dir(root: &Path, dir: &Path, hash: &mut u64) -> Result<()> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| FsError::Syscall { operation: "read_dir", source })?
        .map(|entry| {
            entry
                .map(|e| e.path())
                .map_err(|source| FsError::Syscall { operation: "read_dir", source })
        })
        .collect::<Result<Vec<_>>>()?;
    children.sort();

    for child in children {
        let meta = fs::symlink_metadata(&child)
            .map_err(|source| FsError::Syscall { operation: "symlink_metadata", source })?;
        let rel = child.strip_prefix(root).unwrap_or(&child);
        *hash = fold_bytes(*hash, rel.as_os_str().as_encoded_bytes());
        *hash = fold_i64(*hash, meta.size() as i64);
        *hash = fold_i64(*hash, meta.mtime());

        if meta.is_dir() {
            fold_dir(root, &child, hash)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn identical_trees_produce_identical_digests() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        for root in [a.path(), b.path()] {
            fs::create_dir(root.join("sub")).unwrap();
            File::create(root.join("sub/file")).unwrap();
        }
        assert_eq!(scan(a.path()).unwrap(), scan(b.path()).unwrap());
    }

    #[test]
    fn differing_contents_produce_differing_digests() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        File::create(a.path().join("file")).unwrap().set_len(0).unwrap();
        File::create(b.path().join("file")).unwrap().set_len(10).unwrap();
        assert_ne!(scan(a.path()).unwrap(), scan(b.path()).unwrap());
    }

    #[test]
    fn empty_tree_is_deterministic() {
        let a = tempdir().unwrap();
        assert_eq!(scan(a.path()).unwrap(), scan(a.path()).unwrap());
    }

    #[test]
    fn does_not_follow_symlinks() {
        let a = tempdir().unwrap();
        fs::create_dir(a.path().join("real")).unwrap();
        std::os::unix::fs::symlink(a.path().join("real"), a.path().join("link")).unwrap();
        // Should not recurse into `link` nor error out trying to.
        assert!(scan(a.path()).is_ok());
    }
}
