//! Per-family probe dispatch (spec §4.3 step 2).

pub mod http;
pub mod socks5;

use crate::config::{Config, ValidationMode};
use crate::result::ProbeOutcome;
use crate::task::Task;

/// Run the probe selected by `config.mode` against one task.
pub async fn run(task: &Task, config: &Config) -> ProbeOutcome {
    match config.mode {
        ValidationMode::HttpEcho | ValidationMode::HttpLoose => {
            http::probe(task, config.mode, &config.target_url, config.timeout).await
        }
        ValidationMode::Socks5Fast | ValidationMode::Socks5Deep => {
            socks5::probe(
                task,
                config.mode,
                config.timeout,
                &config.socks5_connect_target,
            )
            .await
        }
    }
}
