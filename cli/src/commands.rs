pub mod check;
pub mod fetch;

use std::net::IpAddr;
use std::path::PathBuf;

use agentlink_core::data_source::AcquisitionOptions;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agentlink")]
#[command(about = "Fetch and validate the output of monitoring agents.")]
#[command(version)]
pub struct CommandLine {
    /// Configuration file (defaults apply when the default path is absent)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one host's agent output and write it to stdout
    #[command(alias = "f")]
    Fetch(FetchArgs),
    /// Check hosts and print one summary line per host
    #[command(alias = "c")]
    Check(CheckArgs),
}

#[derive(Args)]
pub struct FetchArgs {
    pub host: String,

    /// Connect to this address instead of the configured one
    #[arg(long)]
    pub ip: Option<IpAddr>,

    #[arg(short, long)]
    pub port: Option<u16>,

    /// Connect timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<f64>,

    #[command(flatten)]
    pub cache: CacheArgs,

    /// Report raw socket errors
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(required = true)]
    pub hosts: Vec<String>,

    #[command(flatten)]
    pub cache: CacheArgs,

    /// Maximum number of hosts polled at once
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Args, Clone, Copy)]
pub struct CacheArgs {
    /// Only use cached agent output, never connect
    #[arg(long, conflicts_with = "use_cache")]
    pub cache_only: bool,

    /// Prefer cached agent output, connect when there is none
    #[arg(long)]
    pub use_cache: bool,
}

impl From<CacheArgs> for AcquisitionOptions {
    fn from(args: CacheArgs) -> Self {
        AcquisitionOptions {
            use_cache: args.use_cache,
            cache_only: args.cache_only,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
