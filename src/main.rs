use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use proxy_hunter_rs::batch;
use proxy_hunter_rs::config::{
    Config, ValidationMode, DEFAULT_OUTPUT, DEFAULT_SOCKS5_CONNECT_HOST,
    DEFAULT_SOCKS5_CONNECT_PORT, DEFAULT_TARGET_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS,
};
use proxy_hunter_rs::line_source::{self, LineSource};

/// proxy-hunter-rs — concurrent HTTP/SOCKS5 proxy validation engine.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "proxy-hunter-rs",
    version,
    about = "Validates candidate host:port endpoints as working HTTP or SOCKS5 proxies.",
    long_about = None
)]
struct Cli {
    /// Path to the proxy list file (omit to read stdin).
    #[arg(long = "proxies-file")]
    proxies_file: Option<PathBuf>,

    /// Path to the credential file, one user:pass per line (omit for unauthenticated only).
    #[arg(long = "creds-file")]
    creds_file: Option<PathBuf>,

    /// HTTP validation URL (only used in http-echo/http-loose modes).
    #[arg(long = "target-url", default_value = DEFAULT_TARGET_URL)]
    target_url: String,

    /// Per-I/O timeout, in whole seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Concurrent worker count.
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Output file path.
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Lines per batching window (0 disables chunking).
    #[arg(long = "chunk-size", default_value_t = 0)]
    chunk_size: usize,

    /// Validation mode: http-echo, http-loose, socks5-fast, or socks5-deep.
    #[arg(long, default_value = "http-echo")]
    mode: String,

    /// Increase log verbosity (-v, -vv). Ignored if RUST_LOG is set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "proxy_hunter_rs=info",
        1 => "proxy_hunter_rs=debug",
        _ => "proxy_hunter_rs=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mode: ValidationMode = cli
        .mode
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid --mode option")?;

    Ok(Config {
        proxies_file: cli.proxies_file.clone(),
        creds_file: cli.creds_file.clone(),
        target_url: cli.target_url.clone(),
        timeout: Duration::from_secs(cli.timeout),
        workers: cli.workers,
        output: cli.output.clone(),
        chunk_size: cli.chunk_size,
        mode,
        socks5_connect_target: (
            DEFAULT_SOCKS5_CONNECT_HOST.to_string(),
            DEFAULT_SOCKS5_CONNECT_PORT,
        ),
    })
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let credentials = match &config.creds_file {
        Some(path) => match line_source::load_credentials(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {e}");
                return Ok(ExitCode::FAILURE);
            }
        },
        None => Vec::new(),
    };
    info!(credential_count = credentials.len(), mode = ?config.mode, "starting run");

    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("interrupt received, cancelling run");
        cancel_ctrlc.cancel();
    });

    let config = Arc::new(config);
    let credentials = Arc::new(credentials);

    let run_result = match &config.proxies_file {
        Some(path) => match LineSource::from_path(path) {
            Ok(src) => batch::run(config, credentials, src, cancel).await,
            Err(e) => {
                eprintln!("error: {e}");
                return Ok(ExitCode::FAILURE);
            }
        },
        None => {
            let src = LineSource::from_stdin();
            batch::run(config, credentials, src, cancel).await
        }
    };

    match run_result {
        Ok(summary) => {
            info!(
                windows = summary.windows,
                total_tasks = summary.total_tasks,
                total_accepted = summary.total_accepted,
                "run complete"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
