//! The Local FS Adapter (`spec.md` §4.2): the minimal set of mutation
//! operations against an underlying directory, each taking an already
//! resolved absolute local path (see [`crate::path::RootedPath`]).
//!
//! Every function here returns the POSIX-style convention used on the wire:
//! `0` or positive is success (positive carries a byte count for `write`),
//! negative is `-errno`. This is the one place in the workspace that deals
//! in raw errno numbers; everything above this layer works with `Operation`
//! values and ack frames.

use std::{
    ffi::CString,
    fs::OpenOptions,
    os::unix::{ffi::OsStrExt, fs::OpenOptionsExt, io::AsRawFd},
    path::Path,
};

use nix::{
    errno::Errno,
    fcntl::{self, OFlag},
    sys::stat::{FchmodatFlags, Mode, SFlag, UtimensatFlags},
    unistd::{self, Gid, Uid},
};

use crate::error::{FsError, Result};

fn to_errno(result: std::result::Result<(), Errno>, operation: &'static str) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::debug!(operation, errno = e as i32, "local op failed");
            -(e as i32)
        },
    }
}

fn cpath(path: &Path) -> std::result::Result<CString, Errno> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| Errno::EINVAL)
}

/// `mknod(path, mode, rdev)`: FIFO if the mode's type bits say so, else a
/// device or regular node.
pub fn mknod(path: &Path, mode: u32, rdev: u32) -> i32 {
    let Ok(mode_bits) = Mode::from_bits(mode & 0o7777).ok_or(Errno::EINVAL) else {
        return -(Errno::EINVAL as i32);
    };
    let kind = SFlag::from_bits_truncate(mode);
    to_errno(unistd::mknod(path, kind, mode_bits, u64::from(rdev)), "mknod")
}

/// `mkdir(path, mode)`.
pub fn mkdir(path: &Path, mode: u32) -> i32 {
    let Some(mode_bits) = Mode::from_bits(mode & 0o7777) else {
        return -(Errno::EINVAL as i32);
    };
    to_errno(unistd::mkdir(path, mode_bits), "mkdir")
}

/// `unlink(path)`.
pub fn unlink(path: &Path) -> i32 {
    to_errno(unistd::unlink(path), "unlink")
}

/// `rmdir(path)`.
pub fn rmdir(path: &Path) -> i32 {
    to_errno(unistd::rmdir(path), "rmdir")
}

/// `symlink(from, to)`: creates a symlink named `to` pointing at the literal
/// text `from` (which is not itself resolved against any root — it is
/// whatever target text the original caller used, e.g. `../target`).
pub fn symlink(from: &str, to: &Path) -> i32 {
    to_errno(unistd::symlinkat(from, None, to), "symlink")
}

/// `rename(from, to, flags)`. `flags` must be 0 (`spec.md` §4.2).
pub fn rename(from: &Path, to: &Path, flags: u32) -> i32 {
    if flags != 0 {
        return FsError::RenameFlagsNotSupported(flags).errno();
    }
    to_errno(unistd::rename(from, to), "rename")
}

/// `link(from, to)`: hard link.
pub fn link(from: &Path, to: &Path) -> i32 {
    to_errno(unistd::linkat(None, from, None, to, unistd::LinkatFlags::NoSymlinkFollow), "link")
}

/// `chmod(path, mode)`. Does not follow a terminal symlink.
pub fn chmod(path: &Path, mode: u32) -> i32 {
    let Some(mode_bits) = Mode::from_bits(mode & 0o7777) else {
        return -(Errno::EINVAL as i32);
    };
    to_errno(
        nix::sys::stat::fchmodat(None, path, mode_bits, FchmodatFlags::NoFollowSymlink),
        "chmod",
    )
}

/// `chown(path, uid, gid)`. Does not follow a terminal symlink.
pub fn chown(path: &Path, uid: u32, gid: u32) -> i32 {
    to_errno(
        unistd::fchownat(None, path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid)), unistd::FchownatFlags::NoFollowSymlink),
        "chown",
    )
}

/// `truncate(path, size)`.
pub fn truncate(path: &Path, size: u64) -> i32 {
    to_errno(unistd::truncate(path, size as i64), "truncate")
}

/// `write(path, data, offset)`: positional write via `pwrite`, does not
/// disturb any shared file offset. Returns the byte count written, or
/// `-errno`.
pub fn write(path: &Path, data: &[u8], offset: u64) -> i32 {
    let file = match OpenOptions::new().write(true).open(path) {
        Ok(f) => f,
        Err(e) => return -e.raw_os_error().unwrap_or(libc::EIO),
    };
    match nix::sys::uio::pwrite(&file, data, offset as i64) {
        Ok(n) => n as i32,
        Err(e) => -(e as i32),
    }
}

/// `create(path, mode, flags)`: open-or-create. Returns `(retcode, file)`
/// where `retcode` is `0` on success and `-errno` on failure; `file` is
/// `None` on failure.
pub fn create(path: &Path, mode: u32, flags: u32) -> (i32, Option<std::fs::File>) {
    let mut opts = OpenOptions::new();
    let oflag = OFlag::from_bits_truncate(flags as i32);
    opts.create(true)
        .write(oflag.contains(OFlag::O_WRONLY) || oflag.contains(OFlag::O_RDWR))
        .read(!oflag.contains(OFlag::O_WRONLY))
        .truncate(oflag.contains(OFlag::O_TRUNC))
        .mode(mode & 0o7777);
    match opts.open(path) {
        Ok(f) => (0, Some(f)),
        Err(e) => (-e.raw_os_error().unwrap_or(libc::EIO), None),
    }
}

/// `utimens(path, atime, mtime)`: does not follow a terminal symlink.
pub fn utimens(path: &Path, atime: (i64, i64), mtime: (i64, i64)) -> i32 {
    let atime_spec = nix::sys::time::TimeSpec::new(atime.0, atime.1);
    let mtime_spec = nix::sys::time::TimeSpec::new(mtime.0, mtime.1);
    to_errno(
        nix::sys::stat::utimensat(None, path, &atime_spec, &mtime_spec, UtimensatFlags::NoFollowSymlink),
        "utimens",
    )
}

/// `fallocate(path, mode, offset, length)`. `mode` must be 0
/// (`spec.md` §4.2).
pub fn fallocate(path: &Path, mode: u32, offset: u64, length: u64) -> i32 {
    if mode != 0 {
        return FsError::FallocateModeNotSupported(mode).errno();
    }
    let file = match OpenOptions::new().write(true).open(path) {
        Ok(f) => f,
        Err(e) => return -e.raw_os_error().unwrap_or(libc::EIO),
    };
    to_errno(
        fcntl::fallocate(file.as_raw_fd(), fcntl::FallocateFlags::empty(), offset as i64, length as i64),
        "fallocate",
    )
}

/// `setxattr(path, name, value, flags)`. Operates on the symlink itself,
/// never following a terminal symlink — the `xattr` crate's public API
/// always follows, so this goes through `libc::lsetxattr` directly, which is
/// also the one narrow and deliberate use of raw libc in this adapter.
pub fn setxattr(path: &Path, name: &str, value: &[u8], flags: u32) -> i32 {
    let Ok(cpath) = cpath(path) else { return -(Errno::EINVAL as i32) };
    let Ok(cname) = CString::new(name) else { return -(Errno::EINVAL as i32) };
    #[allow(unsafe_code)]
    let rc = unsafe {
        libc::lsetxattr(
            cpath.as_ptr(),
            cname.as_ptr(),
            value.as_ptr().cast(),
            value.len(),
            flags as i32,
        )
    };
    if rc == 0 { 0 } else { -std::io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO) }
}

/// `removexattr(path, name)`. Same non-following behavior as `setxattr`.
pub fn removexattr(path: &Path, name: &str) -> i32 {
    let Ok(cpath) = cpath(path) else { return -(Errno::EINVAL as i32) };
    let Ok(cname) = CString::new(name) else { return -(Errno::EINVAL as i32) };
    #[allow(unsafe_code)]
    let rc = unsafe { libc::lremovexattr(cpath.as_ptr(), cname.as_ptr()) };
    if rc == 0 { 0 } else { -std::io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO) }
}
