//! Transport abstraction
//!
//! The session talks to the server through [`Transport`], which carries text
//! frames in both directions. [`WsTransport`] is the real WebSocket connection;
//! [`MockTransport`] is an in-memory pair for tests.

use crate::{ClientError, Result};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// One inbound unit from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text payload
    Text(String),

    /// The peer closed the connection
    Close { code: Option<u16>, reason: String },
}

impl Frame {
    /// Close frame for a connection that ended without a close handshake
    pub fn dropped() -> Self {
        Frame::Close {
            code: None,
            reason: String::new(),
        }
    }
}

/// Transport trait
///
/// Implementations must allow `send` and `receive` to run concurrently.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text frame
    async fn send(&self, text: String) -> Result<()>;

    /// Wait for the next inbound frame
    async fn receive(&self) -> Result<Frame>;

    /// Get the transport name
    fn name(&self) -> &str;

    /// Whether frames can still be sent
    fn is_open(&self) -> bool;

    /// Close the transport
    async fn close(&self) -> Result<()>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport over `ws://` or `wss://`
pub struct WsTransport {
    name: String,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    open: AtomicBool,
}

impl WsTransport {
    /// Open a WebSocket to `url`, giving up after `timeout`
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        debug!(url, "Opening WebSocket");

        let (ws, response) =
            match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url)).await {
                Ok(Ok(pair)) => pair,
                Ok(Err(e)) => return Err(ClientError::Connection(e.to_string())),
                Err(_) => return Err(ClientError::ConnectTimeout(timeout.as_secs())),
            };

        debug!(status = %response.status(), "WebSocket open");

        let (sink, stream) = ws.split();

        Ok(Self {
            name: url.to_string(),
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            open: AtomicBool::new(true),
        })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&self, text: String) -> Result<()> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::text(text)).await?;
        Ok(())
    }

    async fn receive(&self) -> Result<Frame> {
        let mut stream = self.stream.lock().await;

        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Frame::Text(text.as_str().to_owned())),
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Frame::Text(String::from_utf8_lossy(&data).into_owned()))
                }
                Some(Ok(Message::Close(close))) => {
                    self.open.store(false, Ordering::SeqCst);
                    return Ok(match close {
                        Some(close) => Frame::Close {
                            code: Some(u16::from(close.code)),
                            reason: close.reason.as_str().to_owned(),
                        },
                        None => Frame::dropped(),
                    });
                }
                // Ping/pong are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(tungstenite::Error::ConnectionClosed))
                | Some(Err(tungstenite::Error::AlreadyClosed))
                | None => {
                    self.open.store(false, Ordering::SeqCst);
                    return Ok(Frame::dropped());
                }
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        debug!("Closing WebSocket");
        let mut sink = self.sink.lock().await;
        match sink.close().await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Mock transport using in-memory channels
pub struct MockTransport {
    name: String,
    rx: Mutex<mpsc::UnboundedReceiver<Frame>>,
    tx: std::sync::Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    open: AtomicBool,
    sent: AtomicUsize,
}

impl MockTransport {
    /// Create a pair of mock transports (client and server)
    pub fn create_pair() -> (Self, Self) {
        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();

        (
            Self::new("mock-client", client_tx, client_rx),
            Self::new("mock-server", server_tx, server_rx),
        )
    }

    fn new(
        name: &str,
        tx: mpsc::UnboundedSender<Frame>,
        rx: mpsc::UnboundedReceiver<Frame>,
    ) -> Self {
        Self {
            name: name.to_string(),
            rx: Mutex::new(rx),
            tx: std::sync::Mutex::new(Some(tx)),
            open: AtomicBool::new(true),
            sent: AtomicUsize::new(0),
        }
    }

    /// Number of frames successfully sent through this end
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    /// Deliver a close frame to the peer
    pub fn send_close(&self, code: u16, reason: &str) -> Result<()> {
        self.push(Frame::Close {
            code: Some(code),
            reason: reason.to_string(),
        })
    }

    fn push(&self, frame: Frame) -> Result<()> {
        let tx = self
            .tx
            .lock()
            .map_err(|_| ClientError::Transport("Mock sender poisoned".to_string()))?;
        tx.as_ref()
            .ok_or_else(|| ClientError::Transport("Mock transport closed".to_string()))?
            .send(frame)
            .map_err(|_| ClientError::Transport("Send failed".to_string()))?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, text: String) -> Result<()> {
        self.push(Frame::Text(text))
    }

    async fn receive(&self) -> Result<Frame> {
        let mut rx = self.rx.lock().await;
        Ok(rx.recv().await.unwrap_or_else(Frame::dropped))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        self.open.store(false, Ordering::SeqCst);
        if let Ok(mut tx) = self.tx.lock() {
            tx.take();
        }
        Ok(())
    }
}
