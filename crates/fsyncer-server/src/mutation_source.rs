//! The Mutation Source boundary (`spec.md` §1, §2) and the handler that
//! sits between it and the rest of the server.
//!
//! The Mutation Source itself — the kernel (or Dokan) callback provider
//! that calls into this process for every intercepted filesystem call — is
//! explicitly out of scope (`spec.md` §1 Non-goals). [`MutationSource`]
//! only names the interface a real one would implement, so the rest of the
//! server can be built and tested against it. [`MutationHandler`] is the
//! "server handler" box in `spec.md` §2's data-flow diagram: it applies a
//! mutation locally via the Local FS Adapter, then hands it to the Fan-out
//! Engine.

use std::sync::Mutex;

use fsyncer_fs::{adapter, HandleCache, RootedPath};
use fsyncer_proto::Operation;

use crate::fanout::FanoutEngine;

/// A source of intercepted mutations, called once per filesystem mutation.
///
/// A production implementation wraps a FUSE/Dokan callback table; tests
/// can implement this over an in-memory queue.
pub trait MutationSource {
    /// Block until the next mutation is available, or `None` once the
    /// source is permanently exhausted (e.g. the mount point was torn
    /// down).
    fn recv(&mut self) -> Option<(u64, Operation)>;
}

/// Applies a decoded mutation to the local tree and forwards it to the
/// fan-out engine, in that order (`spec.md` §2).
pub struct MutationHandler {
    root: RootedPath,
    handles: Mutex<HandleCache>,
    engine: FanoutEngine,
}

impl MutationHandler {
    /// Build a handler rooted at `root`, broadcasting through `engine`.
    #[must_use]
    pub fn new(root: RootedPath, engine: FanoutEngine) -> Self {
        Self { root, handles: Mutex::new(HandleCache::default()), engine }
    }

    /// Apply `op` locally, then broadcast it, returning the local
    /// operation's return code (what the Mutation Source reports back to
    /// its caller).
    pub fn apply(&self, tid: u64, op: Operation) -> i32 {
        let retcode = self.apply_locally(&op);
        self.engine.broadcast(tid, &op);
        retcode
    }

    fn apply_locally(&self, op: &Operation) -> i32 {
        let mut handles = self.handles.lock().expect("handle cache mutex poisoned");
        match op {
            Operation::Mknod { path, mode, rdev } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                adapter::mknod(&p, *mode, *rdev)
            },
            Operation::Mkdir { path, mode } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                adapter::mkdir(&p, *mode)
            },
            Operation::Unlink { path } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                handles.evict(path);
                adapter::unlink(&p)
            },
            Operation::Rmdir { path } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                handles.evict(path);
                adapter::rmdir(&p)
            },
            Operation::Symlink { from, to } => {
                let Ok(p) = self.root.resolve(to) else { return -libc::EOVERFLOW };
                adapter::symlink(from, &p)
            },
            Operation::Rename { from, to, flags } => {
                let (Ok(f), Ok(t)) = (self.root.resolve(from), self.root.resolve(to)) else {
                    return -libc::EOVERFLOW;
                };
                handles.evict(from);
                handles.evict(to);
                adapter::rename(&f, &t, *flags)
            },
            Operation::Link { from, to } => {
                let (Ok(f), Ok(t)) = (self.root.resolve(from), self.root.resolve(to)) else {
                    return -libc::EOVERFLOW;
                };
                adapter::link(&f, &t)
            },
            Operation::Chmod { path, mode } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                adapter::chmod(&p, *mode)
            },
            Operation::Chown { path, uid, gid } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                adapter::chown(&p, *uid, *gid)
            },
            Operation::Truncate { path, size } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                adapter::truncate(&p, *size)
            },
            Operation::Write { path, data, offset } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                adapter::write(&p, data, *offset)
            },
            Operation::Create { path, mode, flags } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                let (rc, file) = adapter::create(&p, *mode, *flags);
                if let Some(file) = file {
                    handles.insert(path.clone(), file);
                }
                rc
            },
            Operation::Utimens { path, atime, mtime } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                adapter::utimens(&p, (atime.sec, atime.nsec), (mtime.sec, mtime.nsec))
            },
            Operation::Fallocate { path, mode, offset, length } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                adapter::fallocate(&p, *mode, *offset, *length)
            },
            Operation::Setxattr { path, name, value, flags } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                adapter::setxattr(&p, name, value, *flags)
            },
            Operation::Removexattr { path, name } => {
                let Ok(p) = self.root.resolve(path) else { return -libc::EOVERFLOW };
                adapter::removexattr(&p, name)
            },
            Operation::Nop => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{net::TcpListener, thread, time::Duration};

    use tempfile::tempdir;

    use super::*;
    use crate::cork::CorkState;

    #[test]
    fn mkdir_applies_locally_and_broadcasts() {
        let dir = tempdir().unwrap();
        let engine = FanoutEngine::new(CorkState::new(), Duration::from_secs(1));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let connector = thread::spawn(move || std::net::TcpStream::connect(addr).unwrap());
        let (server_side, _) = listener.accept().unwrap();
        let mut client_side = connector.join().unwrap();
        engine.peers().lock().unwrap().insert(fsyncer_proto::PeerMode::Async, server_side, 0);

        let handler = MutationHandler::new(RootedPath::new(dir.path()), engine);
        let rc = handler.apply(0, Operation::Mkdir { path: "/sub".into(), mode: 0o755 });
        assert_eq!(rc, 0);
        assert!(dir.path().join("sub").is_dir());

        use std::io::Read;
        let mut header = [0u8; fsyncer_proto::HEADER_SIZE];
        client_side.read_exact(&mut header).unwrap();
    }
}
