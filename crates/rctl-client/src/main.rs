//! rctl - Remote control client
//!
//! Connects to a remote control server over WebSocket, authenticates with a
//! passkey and relays typed commands in an interactive prompt.

use clap::Parser;
use rctl_client::app::{shutdown_signal, App, Outcome};
use rctl_client::config::ClientConfig;
use rctl_client::logging::{init_logging, PrinterSlot};
use rctl_client::repl::ExitReason;
use rctl_client::ErrorKind;
use std::process::ExitCode;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address: host, host:port, ws://host[:port] or wss://host[:port]
    host: String,

    /// Shared passkey (empty if omitted)
    passkey: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Seconds to wait for the connection to open
    #[arg(long, default_value_t = 5)]
    connect_timeout: u64,

    /// Seconds to wait for the authentication reply
    #[arg(long, default_value_t = 5)]
    auth_timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let printer = PrinterSlot::new();
    init_logging(args.verbose, printer.clone());

    // wss:// needs a process-wide TLS provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("TLS crypto provider already installed");
    }

    let config = ClientConfig::new(&args.host, args.passkey)
        .with_timeouts(args.connect_timeout, args.auth_timeout);
    let target = config.target.clone();

    let app = match App::start_until(config, printer, shutdown_signal()).await {
        Ok(Some(app)) => app,
        Ok(None) => {
            info!("Stopped before the session was established");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("{}", e);
            match e.kind() {
                ErrorKind::Connection => error!(
                    "Check the protocol ({}), host ({}) and port ({})",
                    target.protocol, target.host, target.port
                ),
                ErrorKind::Authentication => error!("Check the passkey"),
                ErrorKind::Transport | ErrorKind::LocalCommand => {}
            }
            return ExitCode::FAILURE;
        }
    };

    let result = app.run().await;
    app.shutdown().await;

    match result {
        Ok(Outcome::Shell(ExitReason::ServerClosed { .. })) => {
            info!("Session ended by server");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("REPL error: {}", e);
            ExitCode::FAILURE
        }
    }
}
