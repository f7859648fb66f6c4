//! rctl Protocol Definitions
//!
//! This crate defines the handshake wire format spoken by rctl before the
//! connection switches to plain text passthrough.

pub mod error;
pub mod messages;
pub mod protocol;

pub use error::{ProtocolError, Result};
pub use messages::{Message, MessageType};
pub use protocol::{embedded_message_type, ProtocolCodec, MAX_MESSAGE_SIZE, TYPE_FIELD};
