//! SOCKS5 probe (spec §4.5).
//!
//! Grounded in the embedded Go cores of `examples/original_source/socks5.py`
//! (`isSocks5` for the handshake-only depth, `checkProxyAuth` for the
//! authenticated variant) and the wire-format reference in
//! `other_examples/.../proxy-socks-v5-mod.rs.rs`.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::ValidationMode;
use crate::result::{ProbeOutcome, RejectReason};
use crate::task::Task;

const NO_AUTH: u8 = 0x00;
const USER_PASS: u8 = 0x02;
const NO_ACCEPTABLE_METHODS: u8 = 0xFF;
const ATYP_DOMAIN: u8 = 0x03;
const CMD_CONNECT: u8 = 0x01;
const SOCKS_VERSION: u8 = 0x05;

pub async fn probe(
    task: &Task,
    mode: ValidationMode,
    timeout_dur: Duration,
    connect_target: &(String, u16),
) -> ProbeOutcome {
    let addr = format!("{}:{}", task.endpoint.host, task.endpoint.port);

    let mut stream = match timeout(timeout_dur, TcpStream::connect(&addr)).await {
        Ok(Ok(s)) => s,
        Ok(Err(_)) => return ProbeOutcome::Rejected(RejectReason::TcpDialFailure),
        Err(_) => return ProbeOutcome::Rejected(RejectReason::Timeout),
    };

    let handshake = if task.credential.is_some() {
        negotiate_authenticated(&mut stream, task, timeout_dur).await
    } else {
        negotiate_no_auth(&mut stream, timeout_dur).await
    };

    if let Err(reason) = handshake {
        return ProbeOutcome::Rejected(reason);
    }

    if matches!(mode, ValidationMode::Socks5Fast) {
        return ProbeOutcome::Valid(task.endpoint.to_string());
    }

    match connect_verify(&mut stream, connect_target, timeout_dur).await {
        Ok(()) => ProbeOutcome::Valid(task.endpoint.to_string()),
        Err(reason) => ProbeOutcome::Rejected(reason),
    }
}

/// `05 01 00` negotiation: the only method offered is NO_AUTH.
async fn negotiate_no_auth(
    stream: &mut TcpStream,
    timeout_dur: Duration,
) -> Result<(), RejectReason> {
    write_with_deadline(stream, &[SOCKS_VERSION, 0x01, NO_AUTH], timeout_dur).await?;
    let reply = read_exact_with_deadline::<2>(stream, timeout_dur).await?;
    if reply[0] != SOCKS_VERSION {
        return Err(RejectReason::HandshakeMalformed);
    }
    match reply[1] {
        NO_AUTH => Ok(()),
        NO_ACCEPTABLE_METHODS => Err(RejectReason::AuthRequired),
        // The server picked a method we never offered (e.g. USER_PASS):
        // it requires auth we didn't bring, not a valid no-auth accept.
        USER_PASS => Err(RejectReason::AuthRequired),
        _ => Err(RejectReason::HandshakeMalformed),
    }
}

/// `05 02 00 02` negotiation: advertise both NO_AUTH and USER_PASS, then
/// perform RFC 1929 sub-negotiation if the server selects USER_PASS.
async fn negotiate_authenticated(
    stream: &mut TcpStream,
    task: &Task,
    timeout_dur: Duration,
) -> Result<(), RejectReason> {
    write_with_deadline(
        stream,
        &[SOCKS_VERSION, 0x02, NO_AUTH, USER_PASS],
        timeout_dur,
    )
    .await?;
    let reply = read_exact_with_deadline::<2>(stream, timeout_dur).await?;
    if reply[0] != SOCKS_VERSION {
        return Err(RejectReason::HandshakeMalformed);
    }

    match reply[1] {
        NO_AUTH => {
            // The server bypassed auth entirely; this task exists to
            // exercise a specific credential, so a bypass is not evidence
            // that credential is valid.
            Err(RejectReason::AuthFailed)
        }
        USER_PASS => {
            let cred = task
                .credential
                .as_ref()
                .expect("negotiate_authenticated called only when credential is present");
            let mut req = Vec::with_capacity(3 + cred.username.len() + cred.password.len());
            req.push(0x01); // sub-negotiation version
            req.push(cred.username.len() as u8);
            req.extend_from_slice(cred.username.as_bytes());
            req.push(cred.password.len() as u8);
            req.extend_from_slice(cred.password.as_bytes());
            write_with_deadline(stream, &req, timeout_dur).await?;

            let auth_reply = read_exact_with_deadline::<2>(stream, timeout_dur).await?;
            if auth_reply[0] == 0x01 && auth_reply[1] == 0x00 {
                Ok(())
            } else {
                Err(RejectReason::AuthFailed)
            }
        }
        NO_ACCEPTABLE_METHODS => Err(RejectReason::AuthRequired),
        _ => Err(RejectReason::HandshakeMalformed),
    }
}

/// Send a CONNECT request for the reference target and require a success reply.
async fn connect_verify(
    stream: &mut TcpStream,
    target: &(String, u16),
    timeout_dur: Duration,
) -> Result<(), RejectReason> {
    let (host, port) = target;
    let mut req = vec![SOCKS_VERSION, CMD_CONNECT, 0x00, ATYP_DOMAIN];
    req.push(host.len() as u8);
    req.extend_from_slice(host.as_bytes());
    req.extend_from_slice(&port.to_be_bytes());
    write_with_deadline(stream, &req, timeout_dur).await?;

    // Read at least the fixed 4-byte header; the variable-length bound
    // address/port that follows is not needed to judge success.
    let head = read_exact_with_deadline::<4>(stream, timeout_dur).await?;
    if head[1] == 0x00 {
        Ok(())
    } else {
        Err(RejectReason::HandshakeMalformed)
    }
}

async fn write_with_deadline(
    stream: &mut TcpStream,
    buf: &[u8],
    timeout_dur: Duration,
) -> Result<(), RejectReason> {
    match timeout(timeout_dur, stream.write_all(buf)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err(RejectReason::HandshakeMalformed),
        Err(_) => Err(RejectReason::Timeout),
    }
}

async fn read_exact_with_deadline<const N: usize>(
    stream: &mut TcpStream,
    timeout_dur: Duration,
) -> Result<[u8; N], RejectReason> {
    let mut buf = [0u8; N];
    match timeout(timeout_dur, stream.read_exact(&mut buf)).await {
        Ok(Ok(_)) => Ok(buf),
        Ok(Err(_)) => Err(RejectReason::HandshakeMalformed),
        Err(_) => Err(RejectReason::Timeout),
    }
}
