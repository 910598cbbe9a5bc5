//! HTTP-proxy probe and false-positive discriminator (spec §4.4, §4.6).
//!
//! Grounded in the embedded Go `testAsProxy`/`testAsWebServer` pair in
//! `examples/original_source/http.py`, re-expressed with `reqwest::Proxy`
//! the way `other_examples/.../probe_pool.rs` builds a per-task client.

use std::time::Duration;

use serde::Deserialize;

use crate::config::ValidationMode;
use crate::result::{ProbeOutcome, RejectReason};
use crate::task::Task;

/// Byte-identical to the Go source's User-Agent, to match real browser
/// traffic rather than a bot-identifiable default.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Deserialize)]
struct EchoResponse {
    origin: String,
}

pub async fn probe(
    task: &Task,
    mode: ValidationMode,
    target_url: &str,
    timeout_dur: Duration,
) -> ProbeOutcome {
    let proxy_url = build_proxy_url(task);

    let proxy = match reqwest::Proxy::http(&proxy_url) {
        Ok(p) => p,
        Err(_) => return ProbeOutcome::Rejected(RejectReason::HandshakeMalformed),
    };

    let client = match reqwest::Client::builder()
        .proxy(proxy)
        .connect_timeout(timeout_dur)
        .timeout(timeout_dur + Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(_) => return ProbeOutcome::Rejected(RejectReason::HandshakeMalformed),
    };

    let response = match client
        .get(target_url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) if e.is_timeout() => return ProbeOutcome::Rejected(RejectReason::Timeout),
        Err(_) => return ProbeOutcome::Rejected(RejectReason::TcpDialFailure),
    };

    if !response.status().is_success() && !matches!(response.status().as_u16(), 200..=299) {
        return ProbeOutcome::Rejected(RejectReason::StatusNon2xx);
    }

    if matches!(mode, ValidationMode::HttpLoose) {
        return ProbeOutcome::Valid(proxy_url);
    }

    let body = match response.text().await {
        Ok(b) => b,
        Err(_) => return ProbeOutcome::Rejected(RejectReason::BodyMismatch),
    };

    let echo: EchoResponse = match serde_json::from_str(&body) {
        Ok(e) => e,
        Err(_) => return ProbeOutcome::Rejected(RejectReason::BodyMismatch),
    };

    // Literal substring containment, preserved as-is from the source tool
    // (documented false-positive-embedding quirk, see DESIGN.md).
    if !echo.origin.contains(&task.endpoint.host) {
        return ProbeOutcome::Rejected(RejectReason::BodyMismatch);
    }

    match discriminate(&task.endpoint.host, task.endpoint.port, timeout_dur).await {
        DiscriminatorVerdict::PureProxy => ProbeOutcome::Valid(proxy_url),
        DiscriminatorVerdict::WebServer => {
            ProbeOutcome::Rejected(RejectReason::AppearsToBeWebServer)
        }
    }
}

enum DiscriminatorVerdict {
    PureProxy,
    WebServer,
}

/// Independent direct GET to `http://host:port/`, redirects disabled.
/// A 2xx/3xx means the port is actually answering as a web server — reject
/// even though the echo-check above passed.
async fn discriminate(host: &str, port: u16, timeout_dur: Duration) -> DiscriminatorVerdict {
    let client = match reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout_dur)
        .build()
    {
        Ok(c) => c,
        Err(_) => return DiscriminatorVerdict::PureProxy,
    };

    let url = format!("http://{host}:{port}/");
    match client.get(&url).send().await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            if (200..400).contains(&status) {
                DiscriminatorVerdict::WebServer
            } else {
                DiscriminatorVerdict::PureProxy
            }
        }
        Err(_) => DiscriminatorVerdict::PureProxy,
    }
}

fn build_proxy_url(task: &Task) -> String {
    match &task.credential {
        Some(cred) => {
            let user = urlencoding::encode(&cred.username);
            let pass = urlencoding::encode(&cred.password);
            format!(
                "http://{user}:{pass}@{}:{}",
                task.endpoint.host, task.endpoint.port
            )
        }
        None => format!("http://{}:{}", task.endpoint.host, task.endpoint.port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Credential, Endpoint};

    fn task(host: &str, port: u16, cred: Option<Credential>) -> Task {
        Task {
            endpoint: Endpoint {
                host: host.to_string(),
                port,
            },
            credential: cred,
        }
    }

    #[test]
    fn proxy_url_without_credentials() {
        let t = task("1.2.3.4", 8080, None);
        assert_eq!(build_proxy_url(&t), "http://1.2.3.4:8080");
    }

    #[test]
    fn proxy_url_percent_encodes_credentials() {
        let t = task(
            "1.2.3.4",
            8080,
            Some(Credential {
                username: "a@b".to_string(),
                password: "p:w".to_string(),
            }),
        );
        let url = build_proxy_url(&t);
        assert!(url.contains("a%40b"));
        assert!(url.contains("p%3Aw"));
    }
}
