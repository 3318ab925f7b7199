//! Interactive file-transfer client.
//!
//! Run: uftp_client <hostname> <port>

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use uftp::client::{ClientError, UftpClient};
use uftp_rudp::{RudpChannel, UdpEndpoint};

/// Interactive file-transfer client over reliable UDP.
#[derive(Parser)]
#[command(name = "uftp_client")]
struct Args {
    /// Server hostname or address.
    hostname: String,
    /// Server UDP port.
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

fn run(args: &Args) -> Result<(), ClientError> {
    let endpoint = UdpEndpoint::connect((args.hostname.as_str(), args.port))?;
    let mut client = UftpClient::new(RudpChannel::new(endpoint));

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    client.run_shell(&mut input, &mut output)
}
