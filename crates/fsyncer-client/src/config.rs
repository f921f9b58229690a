//! CLI surface and runtime configuration (`spec.md` §6).

use std::path::PathBuf;

use clap::Parser;

/// Default port to connect to on the server.
pub const DEFAULT_PORT: u16 = 2323;

/// Command-line arguments, parsed with `clap`'s derive API.
///
/// `-h/--host` and `-d/--dest` are mandatory; clap exits with status 1 and
/// a usage message if either is missing, matching `spec.md` §6.
#[derive(Debug, Parser)]
#[command(name = "fsyncer-client", about = "Filesystem mutation replication client")]
pub struct ClientArgs {
    /// Run in SYNC mode: ack every applied frame back to the server.
    #[arg(short = 's', long)]
    pub sync: bool,

    /// Server host to connect to.
    #[arg(short = 'h', long)]
    pub host: String,

    /// Server port to connect to.
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Destination root directory that relative wire paths resolve against.
    #[arg(short = 'd', long)]
    pub dest: PathBuf,
}

/// Runtime configuration derived from [`ClientArgs`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Whether to run in SYNC mode.
    pub sync: bool,
    /// Server host to connect to.
    pub host: String,
    /// Server port to connect to.
    pub port: u16,
    /// Destination root directory.
    pub dest: PathBuf,
}

impl From<ClientArgs> for ClientConfig {
    fn from(args: ClientArgs) -> Self {
        Self { sync: args.sync, host: args.host, port: args.port, dest: args.dest }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_flag_carries_through_to_config() {
        let args = ClientArgs {
            sync: true,
            host: "localhost".into(),
            port: DEFAULT_PORT,
            dest: "/tmp".into(),
        };
        let config: ClientConfig = args.into();
        assert!(config.sync);
    }
}
