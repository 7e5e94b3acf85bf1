use std::sync::Arc;
use std::time::Duration;

use agentlink_common::config::Config;
use agentlink_common::network::target::TargetOverrides;
use agentlink_core::data_source::{Acquisition, PayloadSource, TcpDataSource};
use agentlink_core::network::tcp::TcpTransport;
use agentlink_core::network::transport::Transport;
use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::commands::FetchArgs;

pub async fn fetch(config: Arc<Config>, args: FetchArgs, cancel: CancellationToken) -> anyhow::Result<()> {
    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::new(args.debug));
    let overrides: TargetOverrides = TargetOverrides {
        port: args.port,
        timeout: args.timeout.and_then(|t| Duration::try_from_secs_f64(t).ok()),
    };
    let source: TcpDataSource = TcpDataSource::new(
        &config,
        &args.host,
        args.ip,
        overrides,
        transport,
        args.cache.into(),
    );

    info!(host = %args.host, target = %source.describe(), "Fetching agent output");
    let acquisition: Acquisition = source
        .acquire(&cancel)
        .await
        .with_context(|| format!("acquiring agent output of {}", args.host))?;

    match acquisition.source {
        PayloadSource::Live => info!(bytes = acquisition.payload.len(), elapsed = ?acquisition.elapsed, "Received agent output"),
        PayloadSource::Cache { written_at } => info!(bytes = acquisition.payload.len(), %written_at, "Using cached agent output"),
    }

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&acquisition.payload).await?;
    stdout.flush().await?;
    Ok(())
}
