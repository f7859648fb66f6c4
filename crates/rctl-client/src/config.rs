//! Client configuration

use crate::address::Target;
use std::time::Duration;

/// Client configuration, built once from the command line
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server to connect to
    pub target: Target,

    /// Shared passkey sent in the handshake (empty when not supplied)
    pub passkey: String,

    /// Connection timeout (seconds)
    pub connect_timeout: u64,

    /// Authentication timeout (seconds)
    pub auth_timeout: u64,
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_auth_timeout() -> u64 {
    5
}

impl ClientConfig {
    /// Create a configuration for `address` with default timeouts
    pub fn new(address: &str, passkey: Option<String>) -> Self {
        Self {
            target: Target::parse(address),
            passkey: passkey.unwrap_or_default(),
            connect_timeout: default_connect_timeout(),
            auth_timeout: default_auth_timeout(),
        }
    }

    pub fn with_timeouts(mut self, connect_timeout: u64, auth_timeout: u64) -> Self {
        self.connect_timeout = connect_timeout;
        self.auth_timeout = auth_timeout;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Protocol;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("localhost", None);
        assert_eq!(config.target.protocol, Protocol::Ws);
        assert_eq!(config.passkey, "");
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.auth_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config =
            ClientConfig::new("wss://ops.lan:443", Some("pk".into())).with_timeouts(2, 9);
        assert_eq!(config.target.port, 443);
        assert_eq!(config.passkey, "pk");
        assert_eq!(config.connect_timeout, 2);
        assert_eq!(config.auth_timeout, 9);
    }
}
