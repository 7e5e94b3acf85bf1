use std::sync::Arc;
use std::time::{Duration, Instant};

use agentlink_common::config::Config;
use agentlink_common::network::target::TargetOverrides;
use agentlink_common::state::ServiceState;
use agentlink_core::data_source::{AcquisitionOptions, TcpDataSource};
use agentlink_core::network::tcp::TcpTransport;
use agentlink_core::network::transport::Transport;
use agentlink_core::pool::{self, HostOutcome};
use agentlink_core::summary::{self, Summary};
use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::commands::CheckArgs;
use crate::terminal::print;

/// Polls every host and prints its verdict. Returns the worst state seen.
pub async fn check(config: Arc<Config>, args: CheckArgs, cancel: CancellationToken) -> anyhow::Result<ServiceState> {
    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::default());
    let options: AcquisitionOptions = args.cache.into();

    let sources: Vec<TcpDataSource> = args
        .hosts
        .iter()
        .map(|host| {
            TcpDataSource::new(
                &config,
                host,
                None,
                TargetOverrides::default(),
                transport.clone(),
                options,
            )
        })
        .collect();

    let start_time: Instant = Instant::now();
    let max_concurrency: usize = args.concurrency.unwrap_or(config.max_concurrency);
    let outcomes: Vec<HostOutcome> = pool::acquire_all(sources, max_concurrency, &cancel)
        .await
        .context("check run aborted")?;

    print::header("agent check");
    let mut worst: ServiceState = ServiceState::Ok;
    for outcome in &outcomes {
        let verdict: Summary = summary::summarize(&config, &outcome.hostname, &outcome.result);
        print::summary_line(&outcome.hostname, &verdict);
        worst = worst.worst(verdict.state);
    }

    print_totals(outcomes.len(), worst, start_time.elapsed());
    Ok(worst)
}

fn print_totals(hosts: usize, worst: ServiceState, total_time: Duration) {
    print::separator();
    print::status_line(&format!(
        "{hosts} hosts checked in {:.2}s, worst state {worst}",
        total_time.as_secs_f64()
    ));
}
