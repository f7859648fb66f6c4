//! Client error types

use thiserror::Error;

/// Client-related errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// WebSocket open failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// WebSocket did not open in time
    #[error("Connection timeout ({0}s)")]
    ConnectTimeout(u64),

    /// Server answered the handshake with `auth_failed`
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Server did not answer the handshake in time
    #[error("Authentication timeout ({0}s)")]
    AuthTimeout(u64),

    /// Handshake reply was not a recognizable `auth_ok`/`auth_failed`
    #[error("Invalid authentication response: {0}")]
    InvalidAuthResponse(String),

    /// Connection went away before the handshake completed
    #[error("Connection closed during authentication")]
    ClosedDuringAuth,

    /// Socket-level failure on an established connection
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] rctl_proto::ProtocolError),

    /// Not connected
    #[error("Not connected to server")]
    NotConnected,

    /// REPL error
    #[error("REPL error: {0}")]
    Repl(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for ClientError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        ClientError::Repl(err.to_string())
    }
}

/// Broad error category, used to pick the hint shown on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Could not open the connection
    Connection,
    /// Handshake rejected, timed out or malformed
    Authentication,
    /// Socket trouble after the handshake
    Transport,
    /// A local command could not be carried out
    LocalCommand,
}

impl ClientError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Connection(_) | ClientError::ConnectTimeout(_) => ErrorKind::Connection,
            ClientError::AuthFailed(_)
            | ClientError::AuthTimeout(_)
            | ClientError::InvalidAuthResponse(_)
            | ClientError::ClosedDuringAuth
            | ClientError::Protocol(_) => ErrorKind::Authentication,
            ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::NotConnected | ClientError::Repl(_) => ErrorKind::LocalCommand,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
