//! Server address parsing

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Port used when the address does not name one
pub const DEFAULT_PORT: u16 = 9939;

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(wss?)://(.+)$").expect("valid scheme pattern"));

static HOST_PORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+):(\d+)$").expect("valid host:port pattern"));

/// WebSocket scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// Plain `ws://`
    #[default]
    Ws,
    /// TLS `wss://`
    Wss,
}

impl Protocol {
    /// URL scheme for this protocol
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Ws => "ws",
            Protocol::Wss => "wss",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Where to connect, derived once from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
}

impl Target {
    /// Parse a user-supplied address
    ///
    /// Accepts `host`, `host:port`, `ws://host[:port]` and `wss://host[:port]`.
    /// Missing parts fall back to `ws` and [`DEFAULT_PORT`]; the host itself is
    /// not validated.
    pub fn parse(raw: &str) -> Self {
        let (protocol, rest) = match SCHEME_RE.captures(raw) {
            Some(caps) => {
                let protocol = if &caps[1] == "wss" {
                    Protocol::Wss
                } else {
                    Protocol::Ws
                };
                (protocol, caps.get(2).map_or("", |m| m.as_str()))
            }
            None => (Protocol::Ws, raw),
        };

        let host_port = HOST_PORT_RE.captures(rest).and_then(|caps| {
            let port = caps[2].parse::<u16>().ok()?;
            Some((caps[1].to_string(), port))
        });

        let (host, port) = host_port.unwrap_or_else(|| (rest.to_string(), DEFAULT_PORT));

        Self {
            protocol,
            host,
            port,
        }
    }

    /// WebSocket URL for this target
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(raw: &str) -> (Protocol, String, u16) {
        let target = Target::parse(raw);
        (target.protocol, target.host, target.port)
    }

    #[test]
    fn test_bare_host_uses_defaults() {
        assert_eq!(parts("localhost"), (Protocol::Ws, "localhost".into(), 9939));
    }

    #[test]
    fn test_host_and_port() {
        assert_eq!(parts("10.0.0.5:9000"), (Protocol::Ws, "10.0.0.5".into(), 9000));
    }

    #[test]
    fn test_scheme_host_port() {
        assert_eq!(
            parts("wss://example.com:443"),
            (Protocol::Wss, "example.com".into(), 443)
        );
        assert_eq!(
            parts("ws://example.com:8080"),
            (Protocol::Ws, "example.com".into(), 8080)
        );
    }

    #[test]
    fn test_scheme_without_port() {
        assert_eq!(
            parts("wss://control.lan"),
            (Protocol::Wss, "control.lan".into(), 9939)
        );
    }

    #[test]
    fn test_unknown_scheme_is_part_of_host() {
        let target = Target::parse("http://example.com");
        assert_eq!(target.protocol, Protocol::Ws);
        assert_eq!(target.host, "http://example.com");
        assert_eq!(target.port, 9939);
    }

    #[test]
    fn test_out_of_range_port_stays_in_host() {
        assert_eq!(
            parts("example.com:70000"),
            (Protocol::Ws, "example.com:70000".into(), 9939)
        );
    }

    #[test]
    fn test_url() {
        assert_eq!(Target::parse("localhost").url(), "ws://localhost:9939");
        assert_eq!(
            Target::parse("wss://example.com:443").to_string(),
            "wss://example.com:443"
        );
    }
}
