//! Endpoint and credential parsing (spec §3, §4.1).
//!
//! An `Endpoint` is a `host:port` pair kept exactly as written so it can
//! round-trip back into the output; a `Credential` is a `user:pass` pair
//! split on the first `:` only.

use std::fmt;

/// A candidate `host:port` pair under test. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// An optional `(username, password)` pair. Fields are opaque bytes treated
/// as UTF-8; percent-encoded only when embedded in a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

/// Parse a single `host:port` line into an `Endpoint`.
///
/// Splits on the *last* `:` (matching the original tool's plain
/// `strings.Split` behavior) so a bare IPv4/DNS host with a port parses
/// correctly; bracketed IPv6 literals are out of scope. Returns `None` for
/// blank lines, comment lines (`#` at position 0), missing/invalid port, or
/// an empty host.
pub fn parse_endpoint_line(line: &str) -> Option<Endpoint> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (host, port_str) = line.rsplit_once(':')?;
    let host = host.trim();
    if host.is_empty() {
        return None;
    }
    let port: u16 = port_str.trim().parse().ok()?;
    if port == 0 {
        return None;
    }
    Some(Endpoint {
        host: host.to_string(),
        port,
    })
}

/// Parse a single `username:password` line into a `Credential`.
///
/// Splits on the *first* `:` only. A line with no `:` is dropped entirely —
/// it is never treated as `(line, "")`.
pub fn parse_credential_line(line: &str) -> Option<Credential> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (user, pass) = line.split_once(':')?;
    Some(Credential {
        username: user.to_string(),
        password: pass.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port() {
        let e = parse_endpoint_line("203.0.113.5:8080").unwrap();
        assert_eq!(e.host, "203.0.113.5");
        assert_eq!(e.port, 8080);
    }

    #[test]
    fn rejects_comment_and_blank() {
        assert!(parse_endpoint_line("# 1.2.3.4:80").is_none());
        assert!(parse_endpoint_line("   ").is_none());
    }

    #[test]
    fn rejects_missing_or_zero_port() {
        assert!(parse_endpoint_line("example.com").is_none());
        assert!(parse_endpoint_line("example.com:0").is_none());
        assert!(parse_endpoint_line("example.com:notaport").is_none());
    }

    #[test]
    fn credential_splits_on_first_colon_only() {
        let c = parse_credential_line("admin:p:a:ss").unwrap();
        assert_eq!(c.username, "admin");
        assert_eq!(c.password, "p:a:ss");
    }

    #[test]
    fn credential_without_colon_is_dropped() {
        assert!(parse_credential_line("nodicehere").is_none());
    }

    #[test]
    fn credential_comment_and_blank_dropped() {
        assert!(parse_credential_line("# admin:pass").is_none());
        assert!(parse_credential_line("").is_none());
    }
}
