//! Worker pool (spec §4.3, §5).
//!
//! Adapted from `lan-scan-rs::scanner::scan_targets_internal`'s
//! `Semaphore` + `JoinSet` shape, but generalized from "one permit per
//! socket attempt" to a genuine fixed-size worker pool that pulls `Task`s
//! off a shared channel and exits when that channel closes — the spec
//! requires a fixed worker count (§4.3), not a per-item semaphore permit.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::endpoint::{Credential, Endpoint};
use crate::probe;
use crate::result::ProbeOutcome;
use crate::sink::ResultSink;
use crate::task::{self, Task};

/// Outcome of running one batching window's worth of tasks through the pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowStats {
    pub tasks: usize,
    pub accepted: usize,
}

/// Run one full pool lifetime over `endpoints` x `credentials`, streaming
/// every accepted hit into `sink` as it arrives. Returns once the task
/// channel is drained, every worker has exited, and the result channel has
/// closed (spec §4.3: "the pool signals completion via a barrier").
pub async fn run_window(
    config: Arc<Config>,
    endpoints: Vec<Endpoint>,
    credentials: Arc<Vec<Credential>>,
    cancel: CancellationToken,
    sink: &mut ResultSink,
) -> WindowStats {
    let worker_count = config.clamped_workers();
    let expected_tasks = task::task_count(endpoints.len(), credentials.len());

    let (task_tx, task_rx) = mpsc::channel::<Task>(worker_count);
    let task_rx = Arc::new(Mutex::new(task_rx));
    let (result_tx, mut result_rx) = mpsc::channel::<String>(worker_count.max(16));

    let expander_cancel = cancel.clone();
    let expander = tokio::spawn(async move {
        tokio::select! {
            _ = task::expand_into_channel(endpoints, credentials, task_tx) => {}
            _ = expander_cancel.cancelled() => {}
        }
    });

    let mut workers = JoinSet::new();
    for _ in 0..worker_count {
        let task_rx = task_rx.clone();
        let result_tx = result_tx.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        workers.spawn(async move {
            loop {
                let next = {
                    let mut guard = task_rx.lock().await;
                    guard.recv().await
                };
                let task = match next {
                    Some(t) => t,
                    None => break,
                };
                if cancel.is_cancelled() {
                    break;
                }

                let outcome = tokio::select! {
                    outcome = probe::run(&task, &config) => outcome,
                    _ = cancel.cancelled() => continue,
                };

                match outcome {
                    ProbeOutcome::Valid(url) => {
                        if result_tx.send(url).await.is_err() {
                            break;
                        }
                    }
                    ProbeOutcome::Rejected(reason) => {
                        debug!(endpoint = %task.endpoint, %reason, "task rejected");
                    }
                }
            }
        });
    }
    // Drop the pool's own sender clone so the channel closes once every
    // worker's clone has been dropped in turn.
    drop(result_tx);

    let mut stats = WindowStats {
        tasks: expected_tasks,
        accepted: 0,
    };

    while let Some(url) = result_rx.recv().await {
        sink.write_line(&url).await;
        stats.accepted += 1;
    }

    while let Some(res) = workers.join_next().await {
        if let Err(e) = res {
            warn!(error = %e, "worker task panicked");
        }
    }
    if let Err(e) = expander.await {
        warn!(error = %e, "task expander panicked");
    }

    stats
}
