//! Filesystem mutation replication client binary.
//!
//! # Usage
//!
//! ```bash
//! fsyncer-client -h server.example.com -d /srv/replica [-s] [-p 2323]
//! ```

use clap::Parser;
use fsyncer_client::{replay, ClientArgs, ClientConfig};
use fsyncer_fs::RootedPath;
use fsyncer_proto::PeerMode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ClientArgs::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config: ClientConfig = args.into();
    tracing::info!(host = %config.host, port = config.port, dest = %config.dest.display(), sync = config.sync, "fsyncer-client starting");

    let digest = fsyncer_fs::digest::scan(&config.dest)?;
    tracing::info!(digest = format!("{digest:#x}"), "computed destination digest");

    let mode = if config.sync { PeerMode::Sync } else { PeerMode::Async };
    let stream = replay::connect(&config.host, config.port, mode, digest)?;

    replay::run(stream, RootedPath::new(config.dest), config.sync)?;

    Ok(())
}
