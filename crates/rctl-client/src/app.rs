//! Application context
//!
//! [`App`] is built once by the entry point and owns everything the shutdown
//! path needs: the session, the output slot and the terminal snapshot.

use crate::client::Client;
use crate::config::ClientConfig;
use crate::logging::PrinterSlot;
use crate::repl::{ExitReason, Repl};
use crate::terminal::TerminalSnapshot;
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Why the run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The shell stopped on its own
    Shell(ExitReason),
    /// Interrupt or terminate signal
    Signal,
}

/// Top-level application state
pub struct App {
    client: Arc<Client>,
    printer: PrinterSlot,
    terminal: TerminalSnapshot,
}

impl App {
    /// Connect and authenticate
    ///
    /// The shell is never started unless this succeeds; a failed handshake
    /// closes the connection before the error is returned.
    pub async fn start(config: ClientConfig, printer: PrinterSlot) -> Result<Self> {
        let client = Arc::new(Client::new(config));

        client.connect().await?;

        if let Err(e) = client.authenticate().await {
            if let Err(close_err) = client.close().await {
                warn!("Failed to close connection: {}", close_err);
            }
            return Err(e);
        }

        Ok(Self {
            client,
            printer,
            terminal: TerminalSnapshot::capture(),
        })
    }

    /// Like [`App::start`], but gives up when `stop` resolves first
    ///
    /// Returns `Ok(None)` when stopped; the half-open connection is dropped.
    pub async fn start_until<F>(
        config: ClientConfig,
        printer: PrinterSlot,
        stop: F,
    ) -> Result<Option<Self>>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = Self::start(config, printer) => result.map(Some),
            _ = stop => Ok(None),
        }
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Run the shell until it stops or a signal arrives
    pub async fn run(&self) -> Result<Outcome> {
        let repl = Repl::new(self.client.clone(), self.printer.clone());

        tokio::select! {
            result = repl.run() => result.map(Outcome::Shell),
            _ = shutdown_signal() => Ok(Outcome::Signal),
        }
    }

    /// Tear everything down; safe to call more than once
    pub async fn shutdown(&self) {
        self.printer.clear();
        self.terminal.restore();

        if let Err(e) = self.client.close().await {
            warn!("Failed to close connection: {}", e);
        }
        info!("Disconnected");
    }
}

/// Resolve on Ctrl-C or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Interrupted"),
        _ = terminate => info!("Terminated"),
    }
}
