//! Concurrent Client Runner
//!
//! Single-process form of the fork/join barrier: one tokio task per client,
//! each replaying its own sequence and sending its result over a channel.
//! Results are only aggregated after every task has finished.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::backend::TaggedCache;
use crate::error::{BenchError, Result};
use crate::report::ClientResult;
use crate::workload::{replay, Operation};

/// Replays every client's operations concurrently against `cache`.
///
/// `workloads[i]` is the sequence of client `i`. Results come back sorted by
/// client id. If any client fails, the first error by client id is returned
/// and no results are reported.
pub async fn run_clients(
    workloads: Vec<Vec<Operation>>,
    cache: Arc<dyn TaggedCache>,
) -> Result<Vec<ClientResult>> {
    let clients = workloads.len();
    let (tx, mut rx) = mpsc::channel::<(usize, Result<ClientResult>)>(clients.max(1));

    info!("Starting {} clients", clients);
    for (client, ops) in workloads.into_iter().enumerate() {
        let tx = tx.clone();
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            let outcome = replay(client, &ops, cache.as_ref()).await;
            // The receiver only goes away if the runner itself was dropped.
            let _ = tx.send((client, outcome)).await;
        });
    }
    drop(tx);

    let mut outcomes = Vec::with_capacity(clients);
    while let Some(outcome) = rx.recv().await {
        debug!("Client {} finished", outcome.0);
        outcomes.push(outcome);
    }

    if outcomes.len() != clients {
        return Err(BenchError::Backend(format!(
            "{} of {} clients terminated without a result",
            clients - outcomes.len(),
            clients
        )));
    }

    outcomes.sort_by_key(|(client, _)| *client);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}
