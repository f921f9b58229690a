//! The `Operation` sum type: one variant per filesystem mutation, carrying
//! that mutation's payload, with `encode`/`decode` assembled by an
//! exhaustive match rather than a C-style `switch` (`spec.md` §9).

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    codec::{self, Reader},
    error::{ProtocolError, Result},
    header::{FrameHeader, HEADER_SIZE},
    opcode::OpKind,
};

/// A decoded `(seconds, nanoseconds)` timestamp, as carried by `UTIMENS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timespec {
    /// Whole seconds.
    pub sec: i64,
    /// Nanosecond remainder.
    pub nsec: i64,
}

/// A fully decoded mutation operation and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `MKNOD path mode rdev`
    Mknod { path: String, mode: u32, rdev: u32 },
    /// `MKDIR path mode`
    Mkdir { path: String, mode: u32 },
    /// `UNLINK path`
    Unlink { path: String },
    /// `RMDIR path`
    Rmdir { path: String },
    /// `SYMLINK from to`
    Symlink { from: String, to: String },
    /// `RENAME from to flags`
    Rename { from: String, to: String, flags: u32 },
    /// `LINK from to`
    Link { from: String, to: String },
    /// `CHMOD path mode`
    Chmod { path: String, mode: u32 },
    /// `CHOWN path uid gid`
    Chown { path: String, uid: u32, gid: u32 },
    /// `TRUNCATE path size`
    Truncate { path: String, size: u64 },
    /// `WRITE path data offset`
    Write { path: String, data: Bytes, offset: u64 },
    /// `CREATE path mode flags`
    Create { path: String, mode: u32, flags: u32 },
    /// `UTIMENS path atime mtime` (clean big-endian form, `spec.md` §9)
    Utimens { path: String, atime: Timespec, mtime: Timespec },
    /// `FALLOCATE path mode offset length`
    Fallocate { path: String, mode: u32, offset: u64, length: u64 },
    /// `SETXATTR path name value flags`
    Setxattr { path: String, name: String, value: Bytes, flags: u32 },
    /// `REMOVEXATTR path name`
    Removexattr { path: String, name: String },
    /// No-op, acknowledged with `retcode = 0` in SYNC mode.
    Nop,
}

impl Operation {
    /// The wire op kind for this variant.
    #[must_use]
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Mknod { .. } => OpKind::Mknod,
            Self::Mkdir { .. } => OpKind::Mkdir,
            Self::Unlink { .. } => OpKind::Unlink,
            Self::Rmdir { .. } => OpKind::Rmdir,
            Self::Symlink { .. } => OpKind::Symlink,
            Self::Rename { .. } => OpKind::Rename,
            Self::Link { .. } => OpKind::Link,
            Self::Chmod { .. } => OpKind::Chmod,
            Self::Chown { .. } => OpKind::Chown,
            Self::Truncate { .. } => OpKind::Truncate,
            Self::Write { .. } => OpKind::Write,
            Self::Create { .. } => OpKind::Create,
            Self::Utimens { .. } => OpKind::Utimens,
            Self::Fallocate { .. } => OpKind::Fallocate,
            Self::Setxattr { .. } => OpKind::Setxattr,
            Self::Removexattr { .. } => OpKind::Removexattr,
            Self::Nop => OpKind::Nop,
        }
    }

    /// Append the payload (not the frame header) to `dst`.
    pub fn encode_payload(&self, dst: &mut impl BufMut) {
        match self {
            Self::Mknod { path, mode, rdev } => {
                codec::put_string(dst, path);
                dst.put_u32(*mode);
                dst.put_u32(*rdev);
            },
            Self::Mkdir { path, mode } => {
                codec::put_string(dst, path);
                dst.put_u32(*mode);
            },
            Self::Unlink { path } | Self::Rmdir { path } => {
                codec::put_string(dst, path);
            },
            Self::Symlink { from, to } | Self::Link { from, to } => {
                codec::put_string(dst, from);
                codec::put_string(dst, to);
            },
            Self::Rename { from, to, flags } => {
                codec::put_string(dst, from);
                codec::put_string(dst, to);
                dst.put_u32(*flags);
            },
            Self::Chmod { path, mode } => {
                codec::put_string(dst, path);
                dst.put_u32(*mode);
            },
            Self::Chown { path, uid, gid } => {
                codec::put_string(dst, path);
                dst.put_u32(*uid);
                dst.put_u32(*gid);
            },
            Self::Truncate { path, size } => {
                codec::put_string(dst, path);
                dst.put_u64(*size);
            },
            Self::Write { path, data, offset } => {
                codec::put_string(dst, path);
                codec::put_opaque(dst, data);
                dst.put_u64(*offset);
            },
            Self::Create { path, mode, flags } => {
                codec::put_string(dst, path);
                dst.put_u32(*mode);
                dst.put_u32(*flags);
            },
            Self::Utimens { path, atime, mtime } => {
                codec::put_string(dst, path);
                dst.put_i64(atime.sec);
                dst.put_i64(atime.nsec);
                dst.put_i64(mtime.sec);
                dst.put_i64(mtime.nsec);
            },
            Self::Fallocate { path, mode, offset, length } => {
                codec::put_string(dst, path);
                dst.put_u32(*mode);
                dst.put_u64(*offset);
                dst.put_u64(*length);
            },
            Self::Setxattr { path, name, value, flags } => {
                codec::put_string(dst, path);
                codec::put_string(dst, name);
                codec::put_opaque(dst, value);
                dst.put_u32(*flags);
            },
            Self::Removexattr { path, name } => {
                codec::put_string(dst, path);
                codec::put_string(dst, name);
            },
            Self::Nop => {},
        }
    }

    /// Exact encoded payload length, used to size the frame header.
    #[must_use]
    pub fn encoded_payload_len(&self) -> usize {
        match self {
            Self::Mknod { path, .. } => codec::string_len(path) + 4 + 4,
            Self::Mkdir { path, .. } | Self::Chmod { path, .. } => codec::string_len(path) + 4,
            Self::Unlink { path } | Self::Rmdir { path } => codec::string_len(path),
            Self::Symlink { from, to } | Self::Link { from, to } => {
                codec::string_len(from) + codec::string_len(to)
            },
            Self::Rename { from, to, .. } => codec::string_len(from) + codec::string_len(to) + 4,
            Self::Chown { path, .. } => codec::string_len(path) + 4 + 4,
            Self::Truncate { path, .. } => codec::string_len(path) + 8,
            Self::Write { path, data, .. } => codec::string_len(path) + codec::opaque_len(data) + 8,
            Self::Create { path, .. } => codec::string_len(path) + 4 + 4,
            Self::Utimens { path, .. } => codec::string_len(path) + 32,
            Self::Fallocate { path, .. } => codec::string_len(path) + 4 + 8 + 8,
            Self::Setxattr { path, name, value, .. } => {
                codec::string_len(path) + codec::string_len(name) + codec::opaque_len(value) + 4
            },
            Self::Removexattr { path, name } => codec::string_len(path) + codec::string_len(name),
            Self::Nop => 0,
        }
    }

    /// Decode a payload of the given op kind from exactly `buf`.
    pub fn decode_payload(kind: OpKind, buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let op = match kind {
            OpKind::Mknod => {
                let path = non_empty(r.read_string()?)?;
                let mode = r.read_u32()?;
                let rdev = r.read_u32()?;
                Self::Mknod { path, mode, rdev }
            },
            OpKind::Mkdir => {
                let path = non_empty(r.read_string()?)?;
                let mode = r.read_u32()?;
                Self::Mkdir { path, mode }
            },
            OpKind::Unlink => Self::Unlink { path: non_empty(r.read_string()?)? },
            OpKind::Rmdir => Self::Rmdir { path: non_empty(r.read_string()?)? },
            OpKind::Symlink => {
                let from = non_empty(r.read_string()?)?;
                let to = non_empty(r.read_string()?)?;
                Self::Symlink { from, to }
            },
            OpKind::Rename => {
                let from = non_empty(r.read_string()?)?;
                let to = non_empty(r.read_string()?)?;
                let flags = r.read_u32()?;
                Self::Rename { from, to, flags }
            },
            OpKind::Link => {
                let from = non_empty(r.read_string()?)?;
                let to = non_empty(r.read_string()?)?;
                Self::Link { from, to }
            },
            OpKind::Chmod => {
                let path = non_empty(r.read_string()?)?;
                let mode = r.read_u32()?;
                Self::Chmod { path, mode }
            },
            OpKind::Chown => {
                let path = non_empty(r.read_string()?)?;
                let uid = r.read_u32()?;
                let gid = r.read_u32()?;
                Self::Chown { path, uid, gid }
            },
            OpKind::Truncate => {
                let path = non_empty(r.read_string()?)?;
                let size = r.read_u64()?;
                Self::Truncate { path, size }
            },
            OpKind::Write => {
                let path = non_empty(r.read_string()?)?;
                let data = r.read_opaque()?;
                let offset = r.read_u64()?;
                Self::Write { path, data, offset }
            },
            OpKind::Create => {
                let path = non_empty(r.read_string()?)?;
                let mode = r.read_u32()?;
                let flags = r.read_u32()?;
                Self::Create { path, mode, flags }
            },
            OpKind::Utimens => {
                let path = non_empty(r.read_string()?)?;
                let atime = Timespec { sec: r.read_i64()?, nsec: r.read_i64()? };
                let mtime = Timespec { sec: r.read_i64()?, nsec: r.read_i64()? };
                Self::Utimens { path, atime, mtime }
            },
            OpKind::Fallocate => {
                let path = non_empty(r.read_string()?)?;
                let mode = r.read_u32()?;
                let offset = r.read_u64()?;
                let length = r.read_u64()?;
                Self::Fallocate { path, mode, offset, length }
            },
            OpKind::Setxattr => {
                let path = non_empty(r.read_string()?)?;
                let name = r.read_string()?;
                let value = r.read_opaque()?;
                let flags = r.read_u32()?;
                Self::Setxattr { path, name, value, flags }
            },
            OpKind::Removexattr => {
                let path = non_empty(r.read_string()?)?;
                let name = r.read_string()?;
                Self::Removexattr { path, name }
            },
            OpKind::Nop => Self::Nop,
        };
        r.finish()?;
        Ok(op)
    }

    /// Encode this operation as a complete frame (header + payload).
    #[must_use]
    pub fn encode_frame(&self, tid: u64) -> Bytes {
        let payload_len = self.encoded_payload_len();
        let header = FrameHeader::new(self.kind().to_u32(), tid, payload_len);
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload_len);
        buf.put_slice(&header.to_bytes());
        self.encode_payload(&mut buf);
        buf.freeze()
    }

    /// Decode a complete frame (header + payload) from `bytes`, which must
    /// be exactly one frame (no trailing bytes).
    pub fn decode_frame(bytes: &[u8]) -> Result<(u64, Self)> {
        let header = FrameHeader::from_bytes(bytes)?;
        let total = header.length() as usize;
        if bytes.len() < total {
            return Err(ProtocolError::FrameTruncated {
                expected: header.payload_len() as usize,
                actual: bytes.len().saturating_sub(HEADER_SIZE),
            });
        }
        let kind = OpKind::try_from(header.kind())?;
        let payload = &bytes[HEADER_SIZE..total];
        let op = Self::decode_payload(kind, payload)?;
        Ok((header.tid(), op))
    }
}

fn non_empty(path: String) -> Result<String> {
    if path.is_empty() {
        return Err(ProtocolError::EmptyPath);
    }
    Ok(path)
}
