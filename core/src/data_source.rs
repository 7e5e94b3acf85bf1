//! # Agent Data Source
//!
//! Acquires one host's agent output: from the cache when the caller allows
//! it, otherwise live over the [`Transport`], and always through the
//! encryption negotiator. Successful live fetches are written back to the
//! cache in their raw form.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agentlink_common::config::{Config, EncryptionPolicy};
use agentlink_common::error::{AgentError, Result};
use agentlink_common::network::target::{HostTarget, TargetOverrides};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::agent_info::{self, AgentInfo};
use crate::cache::{AgentCache, CacheEntry};
use crate::negotiator;
use crate::network::transport::Transport;

/// Per-call cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionOptions {
    /// Serve a usable cache entry instead of fetching.
    pub use_cache: bool,
    /// Never fetch; no usable cache entry is an error.
    pub cache_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    Live,
    Cache { written_at: DateTime<Utc> },
}

/// Decoded agent output for one host.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub payload: Vec<u8>,
    pub source: PayloadSource,
    pub elapsed: Duration,
    pub info: AgentInfo,
}

impl Acquisition {
    fn new(payload: Vec<u8>, source: PayloadSource, elapsed: Duration) -> Self {
        let info: AgentInfo = agent_info::parse(&payload);
        Self {
            payload,
            source,
            elapsed,
            info,
        }
    }
}

pub struct TcpDataSource {
    target: HostTarget,
    encryption: EncryptionPolicy,
    cache: AgentCache,
    transport: Arc<dyn Transport>,
    options: AcquisitionOptions,
}

impl TcpDataSource {
    pub fn new(
        config: &Config,
        hostname: &str,
        address: Option<IpAddr>,
        overrides: TargetOverrides,
        transport: Arc<dyn Transport>,
        options: AcquisitionOptions,
    ) -> Self {
        Self {
            target: HostTarget::resolve(config, hostname, address, overrides),
            encryption: config.agent_encryption_of(hostname),
            cache: AgentCache::new(config.cache_dir.clone()),
            transport,
            options,
        }
    }

    pub fn id(&self) -> &'static str {
        "agent"
    }

    pub fn describe(&self) -> String {
        self.target.describe()
    }

    pub fn hostname(&self) -> &str {
        &self.target.hostname
    }

    pub fn target(&self) -> &HostTarget {
        &self.target
    }

    pub fn options(&self) -> AcquisitionOptions {
        self.options
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache.path_of(&self.target.hostname)
    }

    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Acquisition> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let started: Instant = Instant::now();
        let hostname: &str = &self.target.hostname;

        if self.options.cache_only || self.options.use_cache {
            match self.cache.read(hostname).await {
                Some(entry) => return self.serve_cached(entry, started),
                None if self.options.cache_only => {
                    return Err(AgentError::CacheUnavailable {
                        path: self.cache_path(),
                    });
                }
                None => debug!(host = hostname, "No usable cache entry, fetching live"),
            }
        }

        let raw: Vec<u8> = self.transport.fetch(&self.target, cancel).await?;
        let payload: Vec<u8> = negotiator::negotiate(&raw, &self.encryption)?.into_owned();

        if let Err(e) = self.cache.write(hostname, &raw).await {
            warn!(host = hostname, path = %self.cache_path().display(), error = %e, "Failed to write cache entry");
        }

        Ok(Acquisition::new(payload, PayloadSource::Live, started.elapsed()))
    }

    fn serve_cached(&self, entry: CacheEntry, started: Instant) -> Result<Acquisition> {
        let payload: Vec<u8> = negotiator::negotiate(&entry.payload, &self.encryption)?.into_owned();
        Ok(Acquisition::new(
            payload,
            PayloadSource::Cache {
                written_at: entry.written_at,
            },
            started.elapsed(),
        ))
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

#[cfg(test)]
mod tests {
    use super::*;
    use agentlink_common::config::{EncryptionMode, HostConfig};
    use agentlink_common::error::ProtocolError;
    use agentlink_protocols::crypto::encrypt_package;
    use agentlink_protocols::envelope::{CURRENT_VERSION, seal};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PLAIN: &[u8] = b"<<<check_mk>>>\nVersion: 1.2.5i4\nAgentOS: linux\n";

    /// Answers every fetch with a fixed result and counts the calls.
    struct ScriptedTransport {
        calls: AtomicUsize,
        reply: Mutex<Option<Vec<u8>>>,
    }

    impl ScriptedTransport {
        fn replying(reply: Option<&[u8]>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: Mutex::new(reply.map(<[u8]>::to_vec)),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn fetch(&self, target: &HostTarget, _cancel: &CancellationToken) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .lock()
                .unwrap()
                .clone()
                .ok_or(AgentError::EmptyData { port: target.port })
        }
    }

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            cache_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    fn source(config: &Config, transport: Arc<ScriptedTransport>, options: AcquisitionOptions) -> TcpDataSource {
        TcpDataSource::new(
            config,
            "web01",
            Some("127.0.0.1".parse().unwrap()),
            TargetOverrides::default(),
            transport,
            options,
        )
    }

    #[tokio::test]
    async fn cache_only_without_entry_never_touches_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = config_in(dir.path());
        let transport = ScriptedTransport::replying(Some(PLAIN));
        let options = AcquisitionOptions {
            cache_only: true,
            ..Default::default()
        };

        let err = source(&config, transport.clone(), options)
            .acquire(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::CacheUnavailable { ref path } if *path == dir.path().join("web01")));
        assert!(err.to_string().starts_with("Got no data: No usable cache file present at"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn live_fetch_populates_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = config_in(dir.path());
        let transport = ScriptedTransport::replying(Some(PLAIN));

        let acquisition: Acquisition = source(&config, transport.clone(), AcquisitionOptions::default())
            .acquire(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(acquisition.payload, PLAIN);
        assert_eq!(acquisition.source, PayloadSource::Live);
        assert_eq!(acquisition.info.version.as_deref(), Some("1.2.5i4"));
        assert_eq!(std::fs::read(dir.path().join("web01")).unwrap(), PLAIN);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn use_cache_serves_entry_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = config_in(dir.path());
        AgentCache::new(dir.path()).write("web01", PLAIN).await.unwrap();
        let transport = ScriptedTransport::replying(None);
        let options = AcquisitionOptions {
            use_cache: true,
            ..Default::default()
        };

        let acquisition: Acquisition = source(&config, transport.clone(), options)
            .acquire(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(acquisition.payload, PLAIN);
        assert!(matches!(acquisition.source, PayloadSource::Cache { .. }));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn use_cache_falls_back_to_live_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = config_in(dir.path());
        std::fs::write(dir.path().join("web01"), b"<<<trunc").unwrap();
        let transport = ScriptedTransport::replying(Some(PLAIN));
        let options = AcquisitionOptions {
            use_cache: true,
            ..Default::default()
        };

        let acquisition: Acquisition = source(&config, transport.clone(), options)
            .acquire(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(acquisition.source, PayloadSource::Live);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn cache_only_rejects_truncated_entry_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = config_in(dir.path());
        std::fs::write(dir.path().join("web01"), b"<<<trunc").unwrap();
        let transport = ScriptedTransport::replying(Some(PLAIN));
        let options = AcquisitionOptions {
            cache_only: true,
            ..Default::default()
        };

        let err = source(&config, transport.clone(), options)
            .acquire(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::CacheUnavailable { ref path } if *path == dir.path().join("web01")));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn cached_bytes_are_stored_raw_and_decrypted_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut config: Config = config_in(dir.path());
        config.hosts.insert(
            "web01".to_string(),
            HostConfig {
                encryption: EncryptionPolicy::new(EncryptionMode::Enforce, "secret"),
                ..HostConfig::default()
            },
        );
        let wire: Vec<u8> = seal(CURRENT_VERSION, &encrypt_package(PLAIN, "secret"));
        let transport = ScriptedTransport::replying(Some(wire.as_slice()));

        let live: Acquisition = source(&config, transport.clone(), AcquisitionOptions::default())
            .acquire(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(live.payload, PLAIN);
        assert_eq!(std::fs::read(dir.path().join("web01")).unwrap(), wire);

        let options = AcquisitionOptions {
            cache_only: true,
            ..Default::default()
        };
        let cached: Acquisition = source(&config, transport.clone(), options)
            .acquire(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(cached.payload, PLAIN);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn rejected_output_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut config: Config = config_in(dir.path());
        config.hosts.insert(
            "web01".to_string(),
            HostConfig {
                encryption: EncryptionPolicy::new(EncryptionMode::Enforce, "secret"),
                ..HostConfig::default()
            },
        );
        let transport = ScriptedTransport::replying(Some(PLAIN));

        let err = source(&config, transport, AcquisitionOptions::default())
            .acquire(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Protocol(ProtocolError::PlaintextEnforced)));
        assert!(!dir.path().join("web01").exists());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = config_in(dir.path());
        let transport = ScriptedTransport::replying(Some(PLAIN));
        let cancel: CancellationToken = CancellationToken::new();
        cancel.cancel();

        let err = source(&config, transport.clone(), AcquisitionOptions::default())
            .acquire(&cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn describes_its_target() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = config_in(dir.path());
        let src: TcpDataSource = source(&config, ScriptedTransport::replying(None), AcquisitionOptions::default());

        assert_eq!(src.id(), "agent");
        assert_eq!(src.describe(), "TCP: 127.0.0.1:6556");
    }
}
