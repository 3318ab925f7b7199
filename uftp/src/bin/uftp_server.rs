//! File server for one client at a time.
//!
//! Run: uftp_server <port>

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uftp::server::{ServerError, UftpServer};
use uftp_rudp::{RudpChannel, UdpEndpoint};

/// File server over reliable UDP, serving the current working directory.
#[derive(Parser)]
#[command(name = "uftp_server")]
struct Args {
    /// UDP port to bind on all interfaces.
    port: u16,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ServerError> {
    let endpoint = UdpEndpoint::bind(args.port)?;
    info!(port = args.port, "listening");

    let root = std::env::current_dir()?;
    let mut server = UftpServer::new(RudpChannel::new(endpoint), root);
    server.serve()
}
