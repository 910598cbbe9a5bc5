//! The probe result sum type (spec §3 Data Model).

use std::fmt;

/// Why a task was rejected. Never surfaced to the user individually —
/// logged at `debug!`/`trace!` only (spec §7: per-task errors are the
/// expected common case, not exceptional).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TcpDialFailure,
    HandshakeMalformed,
    AuthRequired,
    AuthFailed,
    BodyMismatch,
    StatusNon2xx,
    AppearsToBeWebServer,
    Timeout,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::TcpDialFailure => "tcp-dial-failure",
            RejectReason::HandshakeMalformed => "handshake-malformed",
            RejectReason::AuthRequired => "auth-required",
            RejectReason::AuthFailed => "auth-failed",
            RejectReason::BodyMismatch => "body-mismatch",
            RejectReason::StatusNon2xx => "status-non-2xx",
            RejectReason::AppearsToBeWebServer => "appears-to-be-web-server",
            RejectReason::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// The outcome of one probe. Only `Valid` ever escapes a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Valid(String),
    Rejected(RejectReason),
}
