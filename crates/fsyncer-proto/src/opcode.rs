//! The operation-kind discriminant (`spec.md` §3).

use crate::error::ProtocolError;

/// Tagged discriminator over the mutation set plus `NOP`.
///
/// Numeric values are part of the wire format and must never be reordered;
/// append new kinds at the end if the protocol ever grows one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OpKind {
    /// Create a special file (FIFO, device, or regular node).
    Mknod = 0,
    /// Create a directory.
    Mkdir = 1,
    /// Remove a file/symlink/special node.
    Unlink = 2,
    /// Remove an empty directory.
    Rmdir = 3,
    /// Create a symbolic link.
    Symlink = 4,
    /// Rename (move) a path.
    Rename = 5,
    /// Create a hard link.
    Link = 6,
    /// Change permission bits.
    Chmod = 7,
    /// Change owner/group.
    Chown = 8,
    /// Change file size.
    Truncate = 9,
    /// Positional write.
    Write = 10,
    /// Open-or-create a file.
    Create = 11,
    /// Change access/modification times.
    Utimens = 12,
    /// Preallocate space.
    Fallocate = 13,
    /// Set an extended attribute.
    Setxattr = 14,
    /// Remove an extended attribute.
    Removexattr = 15,
    /// No-op, reserved for keepalives/padding.
    Nop = 16,
}

impl OpKind {
    /// All operation kinds, in wire order.
    pub const ALL: [Self; 17] = [
        Self::Mknod,
        Self::Mkdir,
        Self::Unlink,
        Self::Rmdir,
        Self::Symlink,
        Self::Rename,
        Self::Link,
        Self::Chmod,
        Self::Chown,
        Self::Truncate,
        Self::Write,
        Self::Create,
        Self::Utimens,
        Self::Fallocate,
        Self::Setxattr,
        Self::Removexattr,
        Self::Nop,
    ];

    /// The wire value for this kind.
    #[must_use]
    pub fn to_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for OpKind {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL.into_iter().find(|k| k.to_u32() == value).ok_or(ProtocolError::UnknownOpKind(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_wire_value() {
        for kind in OpKind::ALL {
            assert_eq!(OpKind::try_from(kind.to_u32()), Ok(kind));
        }
    }

    #[test]
    fn unknown_value_is_rejected() {
        assert_eq!(OpKind::try_from(999), Err(ProtocolError::UnknownOpKind(999)));
    }
}
