//! Offline convergence-verification tool (`SPEC_FULL.md` §4.3, grounded on
//! the original project's `common/fscompare.c`/`common/fscompare_main.c`):
//! walks two local directory trees independently and reports whether their
//! Metadata Digests match. No network is involved; this is a diagnostic,
//! not part of the replication protocol.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

/// Compare the Metadata Digest of two local directory trees.
#[derive(Debug, Parser)]
#[command(name = "fscompare", about = "Compare two directory trees by metadata digest")]
struct Args {
    /// First directory tree.
    left: PathBuf,
    /// Second directory tree.
    right: PathBuf,
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let left_digest = match fsyncer_fs::digest::scan(&args.left) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("failed to scan {}: {e}", args.left.display());
            return ExitCode::FAILURE;
        },
    };
    let right_digest = match fsyncer_fs::digest::scan(&args.right) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("failed to scan {}: {e}", args.right.display());
            return ExitCode::FAILURE;
        },
    };

    if left_digest == right_digest {
        println!("match: {left_digest:#018x}");
        ExitCode::SUCCESS
    } else {
        println!("mismatch: {} = {left_digest:#018x}, {} = {right_digest:#018x}", args.left.display(), args.right.display());
        ExitCode::FAILURE
    }
}
