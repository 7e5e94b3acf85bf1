mod commands;
mod terminal;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use agentlink_common::config::Config;
use anyhow::Context;
use commands::{CommandLine, Commands, check, fetch};
use terminal::logging;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const DEFAULT_CONFIG_PATH: &str = "/etc/agentlink/agentlink.toml";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose);

    let config: Arc<Config> = Arc::new(load_config(commands.config.as_deref())?);
    let cancel: CancellationToken = CancellationToken::new();
    watch_interrupt(cancel.clone());

    match commands.command {
        Commands::Fetch(args) => {
            fetch::fetch(config, args, cancel).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check(args) => {
            let worst = check::check(config, args, cancel).await?;
            Ok(ExitCode::from(worst.code()))
        }
    }
}

/// An explicit path must exist; the default path is optional.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path).context("loading configuration");
    }

    let default_path: PathBuf = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Config::load(&default_path).context("loading configuration")
    } else {
        debug!(path = %default_path.display(), "No configuration file, using defaults");
        Ok(Config::default())
    }
}

fn watch_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding acquisitions");
            cancel.cancel();
        }
    });
}
