//! Batching driver (spec §4.8): bounds memory on arbitrarily large inputs
//! by running the pool once per fixed-size window of lines, draining fully
//! between windows, and streaming every window's hits into one sink that
//! is truncated once at driver start and appended to thereafter.
//!
//! The "alternative streaming mode" in spec.md (feeding each window to a
//! child executor via stdin) has no analogue once the probing core lives
//! in-process: every window's hits stream straight into the one sink kept
//! open for the whole run, so there is no per-window temp file to
//! concatenate or leak on cancellation (spec.md Design Notes §3).

use std::io::BufRead;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::endpoint::Credential;
use crate::line_source::LineSource;
use crate::pool;
use crate::sink::ResultSink;

#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub windows: usize,
    pub total_tasks: usize,
    pub total_accepted: usize,
}

/// Drive the full pipeline over `line_source`, windowed by
/// `config.chunk_size` (0 disables chunking: one window covering the whole
/// input). Resumption across process restarts is explicitly unsupported —
/// every run starts by truncating the output file.
pub async fn run<R: BufRead>(
    config: Arc<Config>,
    credentials: Arc<Vec<Credential>>,
    mut line_source: LineSource<R>,
    cancel: CancellationToken,
) -> Result<RunSummary, crate::error::OutputError> {
    let mut sink = ResultSink::create(&config.output).await?;
    let mut summary = RunSummary::default();

    loop {
        if cancel.is_cancelled() {
            break;
        }

        // `eof` is the authoritative end-of-input signal. A window can be
        // empty mid-file when every raw line in it fails to parse — that
        // must not be confused with having run out of input.
        let (window, eof) = if config.chunk_size == 0 {
            if summary.windows > 0 {
                break;
            }
            match line_source.drain_endpoints() {
                Ok(w) => (w, true),
                Err(e) => {
                    tracing::error!(error = %e, "failed reading proxy list");
                    break;
                }
            }
        } else {
            match line_source.next_endpoint_window(config.chunk_size) {
                Ok(w) => w,
                Err(e) => {
                    tracing::error!(error = %e, "failed reading proxy list");
                    break;
                }
            }
        };

        if window.is_empty() {
            if eof {
                break;
            }
            continue;
        }

        let window_len = window.len();
        let stats = pool::run_window(
            config.clone(),
            window,
            credentials.clone(),
            cancel.clone(),
            &mut sink,
        )
        .await;

        summary.windows += 1;
        summary.total_tasks += stats.tasks;
        summary.total_accepted += stats.accepted;

        info!(
            window = summary.windows,
            endpoints = window_len,
            tasks = stats.tasks,
            accepted = stats.accepted,
            total_accepted = summary.total_accepted,
            "window complete"
        );

        if config.chunk_size == 0 || eof {
            break;
        }
    }

    sink.flush_and_close().await;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ValidationMode, DEFAULT_TARGET_URL};
    use std::io::Cursor;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn spawn_accepting_socks5_server() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut sock, _) = match listener.accept().await {
                    Ok(s) => s,
                    Err(_) => return,
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 3];
                    if sock.read_exact(&mut buf).await.is_err() {
                        return;
                    }
                    let _ = sock.write_all(&[0x05, 0x00]).await;
                });
            }
        });
        addr
    }

    fn test_config(output: std::path::PathBuf, chunk_size: usize) -> Config {
        Config {
            proxies_file: None,
            creds_file: None,
            target_url: DEFAULT_TARGET_URL.to_string(),
            timeout: Duration::from_millis(500),
            workers: 4,
            output,
            chunk_size,
            mode: ValidationMode::Socks5Fast,
            socks5_connect_target: ("example.com".to_string(), 80),
        }
    }

    /// A window whose raw lines are all unparseable must not be mistaken
    /// for end of input — regression test for the chunking bug where
    /// `next_endpoint_window` being empty was treated as EOF.
    #[tokio::test]
    async fn malformed_window_does_not_truncate_remaining_input() {
        let good = spawn_accepting_socks5_server().await;
        let input = format!(
            "not-an-endpoint\nalso-bad\n1.2.3.4:notaport\n{}:{}\n",
            good.ip(),
            good.port()
        );

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let config = Arc::new(test_config(out.clone(), 1));
        let src = LineSource::new(Cursor::new(input));

        let summary = run(config, Arc::new(Vec::new()), src, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.total_accepted, 1);
        let contents = tokio::fs::read_to_string(&out).await.unwrap();
        assert_eq!(contents.trim(), format!("{}:{}", good.ip(), good.port()));
    }

    /// spec §8 property #4: chunk-size=0 and chunk-size=M yield the same
    /// set of output lines.
    #[tokio::test]
    async fn chunking_is_idempotent_over_output_set() {
        let good1 = spawn_accepting_socks5_server().await;
        let good2 = spawn_accepting_socks5_server().await;
        let input = format!(
            "{}:{}\n127.0.0.1:1\n{}:{}\n",
            good1.ip(),
            good1.port(),
            good2.ip(),
            good2.port()
        );

        let dir = tempfile::tempdir().unwrap();
        let out_whole = dir.path().join("whole.txt");
        let config_whole = Arc::new(test_config(out_whole.clone(), 0));
        let src_whole = LineSource::new(Cursor::new(input.clone()));
        run(
            config_whole,
            Arc::new(Vec::new()),
            src_whole,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let out_chunked = dir.path().join("chunked.txt");
        let config_chunked = Arc::new(test_config(out_chunked.clone(), 1));
        let src_chunked = LineSource::new(Cursor::new(input));
        run(
            config_chunked,
            Arc::new(Vec::new()),
            src_chunked,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let mut whole_lines: Vec<String> = tokio::fs::read_to_string(&out_whole)
            .await
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        let mut chunked_lines: Vec<String> = tokio::fs::read_to_string(&out_chunked)
            .await
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        whole_lines.sort();
        chunked_lines.sort();
        assert_eq!(whole_lines, chunked_lines);
    }
}
