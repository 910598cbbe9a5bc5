//! Task expansion: cross-product of endpoints and credentials (spec §4.2).

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::endpoint::{Credential, Endpoint};

/// One probe assignment: an endpoint plus, optionally, one credential pair.
/// Consumed exactly once by exactly one worker.
#[derive(Debug, Clone)]
pub struct Task {
    pub endpoint: Endpoint,
    pub credential: Option<Credential>,
}

/// Expand one window of endpoints against an optional credential list and
/// push the resulting tasks into a bounded channel.
///
/// - `|credentials| == 0`: one task per endpoint, credential slot empty.
/// - `|credentials| > 0`: one task per `(endpoint, credential)` pair, in
///   lexicographic order — endpoints form the outer loop, credentials the
///   inner loop, matching the source tool's nested iteration order.
///
/// Tasks for the window are generated lazily as they are sent, so memory
/// is bounded by `chunk_size * credential_count`, never the full input.
pub async fn expand_into_channel(
    endpoints: Vec<Endpoint>,
    credentials: Arc<Vec<Credential>>,
    tx: mpsc::Sender<Task>,
) {
    if credentials.is_empty() {
        for endpoint in endpoints {
            if tx
                .send(Task {
                    endpoint,
                    credential: None,
                })
                .await
                .is_err()
            {
                return;
            }
        }
        return;
    }

    for endpoint in endpoints {
        for credential in credentials.iter() {
            let task = Task {
                endpoint: endpoint.clone(),
                credential: Some(credential.clone()),
            };
            if tx.send(task).await.is_err() {
                return;
            }
        }
    }
}

/// Number of tasks a window will expand into, without materializing them.
pub fn task_count(endpoint_count: usize, credential_count: usize) -> usize {
    if credential_count == 0 {
        endpoint_count
    } else {
        endpoint_count * credential_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(h: &str, p: u16) -> Endpoint {
        Endpoint {
            host: h.to_string(),
            port: p,
        }
    }

    fn cred(u: &str, p: &str) -> Credential {
        Credential {
            username: u.to_string(),
            password: p.to_string(),
        }
    }

    #[tokio::test]
    async fn zero_credentials_yields_one_task_per_endpoint() {
        let (tx, mut rx) = mpsc::channel(8);
        let endpoints = vec![ep("a", 1), ep("b", 2)];
        expand_into_channel(endpoints, Arc::new(vec![]), tx).await;
        let mut out = Vec::new();
        while let Some(t) = rx.recv().await {
            out.push(t);
        }
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|t| t.credential.is_none()));
    }

    #[tokio::test]
    async fn credentials_cross_product_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let endpoints = vec![ep("a", 1), ep("b", 2)];
        let creds = vec![cred("u1", "p1"), cred("u2", "p2")];
        expand_into_channel(endpoints, Arc::new(creds), tx).await;
        let mut out = Vec::new();
        while let Some(t) = rx.recv().await {
            out.push(t);
        }
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].endpoint.host, "a");
        assert_eq!(out[0].credential.as_ref().unwrap().username, "u1");
        assert_eq!(out[1].credential.as_ref().unwrap().username, "u2");
        assert_eq!(out[2].endpoint.host, "b");
    }

    #[test]
    fn task_count_matches_invariant() {
        assert_eq!(task_count(5, 0), 5);
        assert_eq!(task_count(5, 3), 15);
    }
}
