//! Handshake message definitions

use serde::{Deserialize, Serialize};

/// Handshake messages, discriminated by the `type` field on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Client presents its passkey
    Auth {
        /// Shared passkey, empty when the user supplied none
        passkey: String,
    },

    /// Server accepted the passkey
    AuthOk,

    /// Server rejected the passkey
    AuthFailed {
        /// Human-readable rejection reason
        #[serde(default)]
        message: String,
    },
}

/// Discriminant values understood by this protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Auth,
    AuthOk,
    AuthFailed,
}

impl MessageType {
    /// Wire name of the discriminant
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Auth => "auth",
            MessageType::AuthOk => "auth_ok",
            MessageType::AuthFailed => "auth_failed",
        }
    }

    /// Look up a discriminant by its wire name
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "auth" => Some(MessageType::Auth),
            "auth_ok" => Some(MessageType::AuthOk),
            "auth_failed" => Some(MessageType::AuthFailed),
            _ => None,
        }
    }
}

impl Message {
    /// Build the client's authentication request
    pub fn auth(passkey: impl Into<String>) -> Self {
        Message::Auth {
            passkey: passkey.into(),
        }
    }

    /// Get the message discriminant
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Auth { .. } => MessageType::Auth,
            Message::AuthOk => MessageType::AuthOk,
            Message::AuthFailed { .. } => MessageType::AuthFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_types() {
        assert_eq!(Message::AuthOk.message_type(), MessageType::AuthOk);
        assert_eq!(Message::auth("k").message_type().as_str(), "auth");
        assert_eq!(MessageType::from_wire("auth_failed"), Some(MessageType::AuthFailed));
        assert_eq!(MessageType::from_wire("AUTH_OK"), None);
    }

    #[test]
    fn test_auth_request_wire_shape() {
        let value = serde_json::to_value(Message::auth("s3cret")).unwrap();
        assert_eq!(value, serde_json::json!({"type": "auth", "passkey": "s3cret"}));
    }

    #[test]
    fn test_auth_ok_ignores_extra_fields() {
        let msg: Message =
            serde_json::from_str(r#"{"type":"auth_ok","server":"lab-01","version":3}"#).unwrap();
        assert_eq!(msg, Message::AuthOk);
    }

    #[test]
    fn test_auth_failed_without_message() {
        let msg: Message = serde_json::from_str(r#"{"type":"auth_failed"}"#).unwrap();
        assert_eq!(
            msg,
            Message::AuthFailed {
                message: String::new()
            }
        );
    }
}
