//! Filesystem mutation replication server binary.
//!
//! # Usage
//!
//! ```bash
//! fsyncer-server --path /srv/replicated --port 2323
//! ```
//!
//! Wiring an actual mutation source (a FUSE or Dokan mount callback table)
//! is mount-point setup, which `spec.md` §1 places out of scope; this
//! binary brings up the network side — accept loop, handshake, fan-out,
//! control loop — against the configured root, ready for a Mutation Source
//! to drive [`fsyncer_server::MutationHandler::apply`] per intercepted call.

use clap::Parser;
use fsyncer_server::{CorkState, FanoutEngine, MutationHandler, ServerArgs, ServerConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ServerArgs::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config: ServerConfig = args.into();
    tracing::info!(root = %config.root.display(), port = config.port, "fsyncer-server starting");

    let local_digest = fsyncer_fs::digest::scan(&config.root)?;
    tracing::info!(digest = format!("{local_digest:#x}"), "computed root digest");

    let listener = std::net::TcpListener::bind(("0.0.0.0", config.port))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    let cork = CorkState::new();
    let engine = FanoutEngine::new(cork, config.ack_timeout);
    let root = fsyncer_fs::RootedPath::new(config.root.clone());
    let _handler = MutationHandler::new(root, engine.clone());

    fsyncer_server::frontend::serve(listener, engine, config.check_digest, config.consistent, local_digest);

    Ok(())
}
