//! CLI surface and runtime configuration (`spec.md` §6, `SPEC_FULL.md` §6).

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// Default port the server listens on for data and control connections.
pub const DEFAULT_PORT: u16 = 2323;

/// Default SYNC-peer ack timeout, in seconds.
pub const DEFAULT_ACK_TIMEOUT_SECS: u64 = 30;

/// Command-line arguments, parsed with `clap`'s derive API.
#[derive(Debug, Parser)]
#[command(name = "fsyncer-server", about = "Filesystem mutation replication server")]
pub struct ServerArgs {
    /// Root directory whose mutations are replicated.
    #[arg(long)]
    pub path: PathBuf,

    /// TCP port to listen on for both data and control connections.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Require every peer to be fully caught up before continuing (all
    /// peers effectively treated as SYNC). Reserved for interactive use;
    /// per-peer mode is still declared at handshake.
    #[arg(long)]
    pub consistent: bool,

    /// Accept a peer's handshake even if its declared digest does not match
    /// this server's own root digest.
    #[arg(long)]
    pub dont_check: bool,

    /// Seconds to wait for a SYNC peer's ack before dropping it.
    #[arg(long, default_value_t = DEFAULT_ACK_TIMEOUT_SECS)]
    pub ack_timeout: u64,
}

/// Runtime configuration derived from [`ServerArgs`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Root directory whose mutations are replicated.
    pub root: PathBuf,
    /// TCP port to listen on.
    pub port: u16,
    /// Whether handshake digest mismatches are rejected.
    pub check_digest: bool,
    /// How long to wait for a SYNC peer's ack.
    pub ack_timeout: Duration,
    /// Force every peer to SYNC mode regardless of its declared handshake
    /// mode.
    pub consistent: bool,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            root: args.path,
            port: args.port,
            check_digest: !args.dont_check,
            ack_timeout: Duration::from_secs(args.ack_timeout),
            consistent: args.consistent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dont_check_flag_disables_digest_checking() {
        let args = ServerArgs {
            path: "/tmp".into(),
            port: DEFAULT_PORT,
            consistent: false,
            dont_check: true,
            ack_timeout: DEFAULT_ACK_TIMEOUT_SECS,
        };
        let config: ServerConfig = args.into();
        assert!(!config.check_digest);
    }
}
