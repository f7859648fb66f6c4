//! Client session management
//!
//! A [`Client`] owns the single connection of a run. It moves through
//! `Idle → Connecting → Connected → Authenticated → Closed` and never goes back.

use crate::transport::{Frame, Transport, WsTransport};
use crate::{config::ClientConfig, ClientError, Result};
use rctl_proto::{Message, ProtocolCodec};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Authenticated,
    Closed,
}

/// Something that happened on an authenticated connection
#[derive(Debug)]
pub enum SessionEvent {
    /// Text pushed by the server
    Message(String),

    /// Socket error; the connection may still be usable
    TransportError(ClientError),

    /// The server closed the connection
    Closed { code: Option<u16>, reason: String },
}

/// Remote control client
pub struct Client {
    /// Client configuration
    config: Arc<ClientConfig>,

    /// Connection state
    state: Arc<RwLock<ConnectionState>>,

    /// Transport (once connected)
    transport: RwLock<Option<Arc<dyn Transport>>>,
}

impl Client {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(ConnectionState::Idle)),
            transport: RwLock::new(None),
        }
    }

    /// Create a client on an already open transport (for testing)
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(ConnectionState::Connected)),
            transport: RwLock::new(Some(transport)),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open the WebSocket
    ///
    /// Calling this while a connection is being opened, or already open, is a
    /// no-op.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            match *state {
                ConnectionState::Idle => *state = ConnectionState::Connecting,
                ConnectionState::Closed => return Err(ClientError::NotConnected),
                _ => return Ok(()),
            }
        }

        let url = self.config.target.url();
        info!("Connecting to {}", url);

        match WsTransport::connect(&url, self.config.connect_timeout()).await {
            Ok(transport) => {
                *self.transport.write().await = Some(Arc::new(transport));
                *self.state.write().await = ConnectionState::Connected;
                info!("Connected");
                Ok(())
            }
            Err(e) => {
                *self.state.write().await = ConnectionState::Closed;
                Err(e)
            }
        }
    }

    /// Perform the passkey handshake
    ///
    /// Sends one `auth` message and waits for one reply, bounded by the
    /// configured auth timeout.
    pub async fn authenticate(&self) -> Result<()> {
        {
            let state = self.state.read().await;
            match *state {
                ConnectionState::Connected => {}
                ConnectionState::Authenticated => return Ok(()),
                _ => return Err(ClientError::NotConnected),
            }
        }

        let transport = self.transport().await.ok_or(ClientError::NotConnected)?;

        let request = ProtocolCodec::encode(&Message::auth(self.config.passkey.as_str()))?;
        debug!("Sending authentication request");
        transport
            .send(request)
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let frame = match tokio::time::timeout(self.config.auth_timeout(), transport.receive())
            .await
        {
            Ok(Ok(frame)) => frame,
            Ok(Err(e)) => return Err(ClientError::Connection(e.to_string())),
            Err(_) => return Err(ClientError::AuthTimeout(self.config.auth_timeout)),
        };

        let reply = match frame {
            Frame::Text(text) => text,
            Frame::Close { code, reason } => {
                debug!(?code, reason = %reason, "Closed during authentication");
                return Err(ClientError::ClosedDuringAuth);
            }
        };

        match ProtocolCodec::decode(&reply) {
            Ok(Message::AuthOk) => {
                *self.state.write().await = ConnectionState::Authenticated;
                info!("Authenticated");
                Ok(())
            }
            Ok(Message::AuthFailed { message }) => Err(ClientError::AuthFailed(message)),
            Ok(other) => Err(ClientError::InvalidAuthResponse(format!(
                "unexpected message type: {}",
                other.message_type().as_str()
            ))),
            Err(e) => Err(ClientError::InvalidAuthResponse(e.to_string())),
        }
    }

    /// Wait for the next event on the connection
    pub async fn next_event(&self) -> SessionEvent {
        let Some(transport) = self.transport().await else {
            return SessionEvent::Closed {
                code: None,
                reason: "not connected".to_string(),
            };
        };

        match transport.receive().await {
            Ok(Frame::Text(text)) => SessionEvent::Message(text),
            Ok(Frame::Close { code, reason }) => SessionEvent::Closed { code, reason },
            Err(e) => SessionEvent::TransportError(e),
        }
    }

    /// Send a command to the server verbatim
    ///
    /// Fails with [`ClientError::NotConnected`] without touching the transport
    /// unless the session is authenticated and the socket is open.
    pub async fn send(&self, command: &str) -> Result<()> {
        if !self.is_authenticated().await {
            return Err(ClientError::NotConnected);
        }

        let transport = self.transport().await.ok_or(ClientError::NotConnected)?;
        if !transport.is_open() {
            return Err(ClientError::NotConnected);
        }

        debug!(command, "Sending command");
        transport.send(command.to_string()).await
    }

    /// Close the connection
    pub async fn close(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if *state == ConnectionState::Closed {
                return Ok(());
            }
            *state = ConnectionState::Closed;
        }

        let transport = self.transport.write().await.take();
        if let Some(transport) = transport {
            if transport.is_open() {
                info!("Closing connection to {}", transport.name());
                transport.close().await?;
            }
        }

        Ok(())
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Check if authenticated
    pub async fn is_authenticated(&self) -> bool {
        *self.state.read().await == ConnectionState::Authenticated
    }

    async fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport.read().await.clone()
    }
}
