use std::sync::Arc;

use agentlink_common::error::{AgentError, Result};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::data_source::{Acquisition, TcpDataSource};

/// Result of one host's acquisition within a pool run.
#[derive(Debug)]
pub struct HostOutcome {
    pub hostname: String,
    pub result: Result<Acquisition>,
}

/// Acquires every source concurrently, at most `max_concurrency` at a time.
///
/// `max_concurrency` is clamped to what a semaphore can hold, with a floor of
/// one. Outcomes come back in the order of `sources`. Per-host failures are
/// reported in their outcome; only cancellation fails the whole run.
pub async fn acquire_all(
    sources: Vec<TcpDataSource>,
    max_concurrency: usize,
    cancel: &CancellationToken,
) -> Result<Vec<HostOutcome>> {
    let total: usize = sources.len();
    let permits: usize = max_concurrency.clamp(1, Semaphore::MAX_PERMITS);
    let semaphore: Arc<Semaphore> = Arc::new(Semaphore::new(permits));
    let mut tasks: JoinSet<(usize, HostOutcome)> = JoinSet::new();

    info!(hosts = total, max_concurrency, "Starting acquisition run");

    for (idx, source) in sources.into_iter().enumerate() {
        let semaphore: Arc<Semaphore> = semaphore.clone();
        let cancel: CancellationToken = cancel.clone();

        tasks.spawn(async move {
            let hostname: String = source.hostname().to_string();
            let result: Result<Acquisition> = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AgentError::Cancelled),
                permit = semaphore.acquire_owned() => match permit {
                    Ok(permit) => acquire_with(permit, &source, &cancel).await,
                    Err(_closed) => Err(AgentError::Cancelled),
                },
            };
            (idx, HostOutcome { hostname, result })
        });
    }

    let mut slots: Vec<Option<HostOutcome>> = (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (idx, outcome) = match joined {
            Ok(done) => done,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => return Err(AgentError::Cancelled),
        };

        if outcome.result.as_ref().is_err_and(AgentError::is_cancelled) {
            debug!(host = %outcome.hostname, "Run cancelled, aborting remaining acquisitions");
            tasks.abort_all();
            return Err(AgentError::Cancelled);
        }
        slots[idx] = Some(outcome);
    }

    Ok(slots.into_iter().flatten().collect())
}

async fn acquire_with(
    _permit: OwnedSemaphorePermit,
    source: &TcpDataSource,
    cancel: &CancellationToken,
) -> Result<Acquisition> {
    debug!(host = source.hostname(), target = %source.describe(), "Acquiring");
    source.acquire(cancel).await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
