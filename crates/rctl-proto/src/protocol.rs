//! Handshake encoding and decoding

use crate::{Message, MessageType, ProtocolError, Result};
use serde_json::Value;

/// Name of the discriminant field in every handshake payload
pub const TYPE_FIELD: &str = "type";

/// Maximum handshake message size (64 KB)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Protocol codec for encoding/decoding handshake messages
pub struct ProtocolCodec;

impl ProtocolCodec {
    /// Encode a message as a single JSON text frame
    pub fn encode(message: &Message) -> Result<String> {
        let payload = serde_json::to_string(message)?;

        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        Ok(payload)
    }

    /// Decode a JSON text frame into a handshake message
    ///
    /// Unknown discriminants are reported as [`ProtocolError::InvalidMessageType`]
    /// so callers can tell them apart from payloads that are not JSON at all.
    pub fn decode(text: &str) -> Result<Message> {
        if text.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: text.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        let value: Value = serde_json::from_str(text)?;

        let kind = match value.get(TYPE_FIELD) {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => return Err(ProtocolError::InvalidMessageType(other.to_string())),
            None => return Err(ProtocolError::MissingType),
        };

        if MessageType::from_wire(&kind).is_none() {
            return Err(ProtocolError::InvalidMessageType(kind));
        }

        Ok(serde_json::from_value(value)?)
    }
}

/// Find a JSON object with a `type` field embedded anywhere in `line`
///
/// The object is taken as the span from the first `{` to the last `}`.
/// Returns the discriminant rendered as text.
pub fn embedded_message_type(line: &str) -> Option<String> {
    let start = line.find('{')?;
    let end = line.rfind('}')?;
    if end <= start {
        return None;
    }

    let value: Value = serde_json::from_str(&line[start..=end]).ok()?;
    match value.as_object()?.get(TYPE_FIELD)? {
        Value::Null => None,
        Value::String(kind) => Some(kind.clone()),
        other => Some(other.to_string()),
    }
}
