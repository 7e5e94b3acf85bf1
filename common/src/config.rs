use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::state::ServiceState;

pub const DEFAULT_AGENT_PORT: u16 = 6556;
const DEFAULT_CONNECT_TIMEOUT_SECS: f64 = 5.0;
const DEFAULT_MAX_CONCURRENCY: usize = 32;

/// Read-only poller configuration, loaded once per run and shared by every
/// acquisition.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_agent_port")]
    pub agent_port: u16,
    #[serde(default = "default_connect_timeout")]
    pub tcp_connect_timeout_secs: f64,
    /// Oldest agent version accepted on any host without its own expectation.
    #[serde(default)]
    pub agent_min_version: Option<String>,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub exit_codes: ExitCodeSpec,
    #[serde(default)]
    pub hosts: HashMap<String, HostConfig>,
}

/// Per-host overrides; every field falls back to the global default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub address: Option<IpAddr>,
    pub port: Option<u16>,
    pub tcp_connect_timeout_secs: Option<f64>,
    /// Bound for the whole read phase. Unset means wait for the agent to close.
    pub read_timeout_secs: Option<f64>,
    pub ipv6_primary: bool,
    pub encryption: EncryptionPolicy,
    pub target_version: Option<VersionSpec>,
    pub exit_codes: ExitCodeSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionMode {
    /// Never decrypt.
    #[default]
    Disabled,
    /// Decrypt what looks encrypted, pass everything else through.
    Allow,
    /// Reject plaintext and fail on undecryptable output.
    Enforce,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct EncryptionPolicy {
    pub mode: EncryptionMode,
    pub passphrase: Option<String>,
}

impl EncryptionPolicy {
    pub fn new(mode: EncryptionMode, passphrase: impl Into<String>) -> Self {
        Self {
            mode,
            passphrase: Some(passphrase.into()),
        }
    }

    pub fn passphrase(&self) -> &str {
        self.passphrase.as_deref().unwrap_or_default()
    }
}

impl fmt::Debug for EncryptionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionPolicy")
            .field("mode", &self.mode)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Which agent versions a host is expected to run.
///
/// ```toml
/// target_version = { exact = "1.2.5i4" }
/// target_version = { at_least = { daily_build = "2014.06.01", release = "1.2.5i4" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSpec {
    Exact(String),
    AtLeast {
        #[serde(default)]
        daily_build: Option<String>,
        #[serde(default)]
        release: Option<String>,
    },
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Exact(version) => write!(f, "{version}"),
            VersionSpec::AtLeast {
                daily_build,
                release,
            } => {
                write!(f, "at least")?;
                if let Some(build) = daily_build {
                    write!(f, " build {build}")?;
                }
                if let Some(release) = release {
                    if daily_build.is_some() {
                        write!(f, " or")?;
                    }
                    write!(f, " release {release}")?;
                }
                Ok(())
            }
        }
    }
}

/// Status overrides keyed by failure category (`wrong_version`, `empty_output`,
/// `connection`, `timeout`, `exception`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ExitCodeSpec(HashMap<String, ServiceState>);

impl ExitCodeSpec {
    pub fn get(&self, category: &str) -> ServiceState {
        self.0
            .get(category)
            .copied()
            .unwrap_or_else(|| default_exit_code(category))
    }

    pub fn set(&mut self, category: impl Into<String>, state: ServiceState) {
        self.0.insert(category.into(), state);
    }

    fn merged_with(&self, overrides: &ExitCodeSpec) -> ExitCodeSpec {
        let mut merged: HashMap<String, ServiceState> = self.0.clone();
        merged.extend(overrides.0.iter().map(|(k, v)| (k.clone(), *v)));
        ExitCodeSpec(merged)
    }
}

fn default_exit_code(category: &str) -> ServiceState {
    match category {
        "wrong_version" => ServiceState::Warn,
        "exception" => ServiceState::Unknown,
        _ => ServiceState::Crit,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_port: default_agent_port(),
            tcp_connect_timeout_secs: default_connect_timeout(),
            agent_min_version: None,
            cache_dir: default_cache_dir(),
            max_concurrency: default_max_concurrency(),
            exit_codes: ExitCodeSpec::default(),
            hosts: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content: String = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = Self::from_toml(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), hosts = config.hosts.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn host(&self, hostname: &str) -> Option<&HostConfig> {
        self.hosts.get(hostname)
    }

    pub fn agent_port_of(&self, hostname: &str) -> u16 {
        self.host(hostname)
            .and_then(|h| h.port)
            .unwrap_or(self.agent_port)
    }

    pub fn tcp_connect_timeout_of(&self, hostname: &str) -> Duration {
        self.host(hostname)
            .and_then(|h| h.tcp_connect_timeout_secs)
            .and_then(positive_secs)
            .or_else(|| positive_secs(self.tcp_connect_timeout_secs))
            .unwrap_or(Duration::from_secs_f64(DEFAULT_CONNECT_TIMEOUT_SECS))
    }

    pub fn read_timeout_of(&self, hostname: &str) -> Option<Duration> {
        self.host(hostname)
            .and_then(|h| h.read_timeout_secs)
            .and_then(positive_secs)
    }

    pub fn is_ipv6_primary(&self, hostname: &str) -> bool {
        self.host(hostname).is_some_and(|h| h.ipv6_primary)
    }

    pub fn address_of(&self, hostname: &str) -> Option<IpAddr> {
        self.host(hostname).and_then(|h| h.address)
    }

    pub fn agent_encryption_of(&self, hostname: &str) -> EncryptionPolicy {
        self.host(hostname)
            .map(|h| h.encryption.clone())
            .unwrap_or_default()
    }

    pub fn agent_target_version(&self, hostname: &str) -> Option<&VersionSpec> {
        self.host(hostname).and_then(|h| h.target_version.as_ref())
    }

    pub fn exit_code_spec(&self, hostname: &str) -> ExitCodeSpec {
        match self.host(hostname) {
            Some(host) => self.exit_codes.merged_with(&host.exit_codes),
            None => self.exit_codes.clone(),
        }
    }
}

fn positive_secs(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
}

fn default_agent_port() -> u16 {
    DEFAULT_AGENT_PORT
}

fn default_connect_timeout() -> f64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("/var/lib/agentlink/cache")
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
