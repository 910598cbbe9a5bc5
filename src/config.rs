//! Immutable run configuration (spec §9 Design Notes: replaces global
//! mutable state with a single value passed into the pool constructor).

use std::path::PathBuf;
use std::time::Duration;

/// Which proxy family and validation depth a run probes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// HTTP forward proxy, validated via echo-check + discriminator.
    HttpEcho,
    /// HTTP forward proxy, validated via status code only (diagnostic-only).
    HttpLoose,
    /// SOCKS5, handshake-only.
    Socks5Fast,
    /// SOCKS5, handshake + live CONNECT to a reference target.
    Socks5Deep,
}

impl ValidationMode {
    pub fn is_http(self) -> bool {
        matches!(self, ValidationMode::HttpEcho | ValidationMode::HttpLoose)
    }
}

impl std::str::FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http-echo" => Ok(ValidationMode::HttpEcho),
            "http-loose" => Ok(ValidationMode::HttpLoose),
            "socks5-fast" => Ok(ValidationMode::Socks5Fast),
            "socks5-deep" => Ok(ValidationMode::Socks5Deep),
            other => Err(format!(
                "unknown mode '{other}' (expected http-echo, http-loose, socks5-fast, or socks5-deep)"
            )),
        }
    }
}

/// One immutable configuration value, built once from CLI arguments and
/// shared (by reference/clone) across the pool and batching driver.
#[derive(Debug, Clone)]
pub struct Config {
    pub proxies_file: Option<PathBuf>,
    pub creds_file: Option<PathBuf>,
    pub target_url: String,
    pub timeout: Duration,
    pub workers: usize,
    pub output: PathBuf,
    pub chunk_size: usize,
    pub mode: ValidationMode,
    /// Reference target used by the SOCKS5 deep CONNECT probe.
    pub socks5_connect_target: (String, u16),
}

impl Config {
    /// Worker count clamped to the fd-safe range documented in spec §5.
    pub fn clamped_workers(&self) -> usize {
        self.workers.clamp(1, 1000)
    }
}

pub const DEFAULT_TARGET_URL: &str = "http://httpbin.org/ip";
pub const DEFAULT_OUTPUT: &str = "valid_proxies.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_WORKERS: usize = 100;
pub const DEFAULT_SOCKS5_CONNECT_HOST: &str = "example.com";
pub const DEFAULT_SOCKS5_CONNECT_PORT: u16 = 80;
