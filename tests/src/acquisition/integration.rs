#![cfg(test)]
use std::sync::Arc;
use std::time::Duration;

use agentlink_common::config::Config;
use agentlink_common::error::{AgentError, ProtocolError};
use agentlink_common::network::target::TargetOverrides;
use agentlink_common::state::ServiceState;
use agentlink_core::data_source::{Acquisition, AcquisitionOptions, PayloadSource, TcpDataSource};
use agentlink_core::network::tcp::TcpTransport;
use agentlink_core::network::transport::Transport;
use agentlink_core::pool::{self, HostOutcome};
use agentlink_core::summary::{self, Summary};
use tokio_util::sync::CancellationToken;

use crate::util::{config_for, encrypted, MockAgent, PLAIN_OUTPUT};

fn source(config: &Config, host: &str, options: AcquisitionOptions) -> TcpDataSource {
    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::default());
    TcpDataSource::new(config, host, None, TargetOverrides::default(), transport, options)
}

const CACHE_ONLY: AcquisitionOptions = AcquisitionOptions {
    use_cache: false,
    cache_only: true,
};

/// A plaintext agent is fetched, summarized and cached verbatim.
#[tokio::test]
async fn plaintext_agent_end_to_end() {
    let agent: MockAgent = MockAgent::serving(PLAIN_OUTPUT).await;
    let dir = tempfile::tempdir().unwrap();
    let config: Config = config_for(dir.path(), &[("web01", agent.port(), "")]);

    let result = source(&config, "web01", AcquisitionOptions::default())
        .acquire(&CancellationToken::new())
        .await;
    let summary: Summary = summary::summarize(&config, "web01", &result);

    let acquisition: Acquisition = result.unwrap();
    assert_eq!(acquisition.payload, PLAIN_OUTPUT);
    assert_eq!(acquisition.source, PayloadSource::Live);
    assert_eq!(summary.state, ServiceState::Ok);
    assert_eq!(summary.output, "Version: 1.2.5i4, OS: linux");
    assert_eq!(std::fs::read(dir.path().join("web01")).unwrap(), PLAIN_OUTPUT);
}

#[tokio::test]
async fn encrypted_agent_is_decrypted_under_enforce() {
    let agent: MockAgent = MockAgent::serving(&encrypted(PLAIN_OUTPUT, "s3cr3t")).await;
    let dir = tempfile::tempdir().unwrap();
    let config: Config = config_for(
        dir.path(),
        &[("web01", agent.port(), "encryption = { mode = \"enforce\", passphrase = \"s3cr3t\" }")],
    );

    let acquisition: Acquisition = source(&config, "web01", AcquisitionOptions::default())
        .acquire(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(acquisition.payload, PLAIN_OUTPUT);
    assert_eq!(acquisition.info.agent_os.as_deref(), Some("linux"));
}

#[tokio::test]
async fn plaintext_agent_fails_when_encryption_is_enforced() {
    let agent: MockAgent = MockAgent::serving(PLAIN_OUTPUT).await;
    let dir = tempfile::tempdir().unwrap();
    let config: Config = config_for(
        dir.path(),
        &[("web01", agent.port(), "encryption = { mode = \"enforce\", passphrase = \"s3cr3t\" }")],
    );

    let result = source(&config, "web01", AcquisitionOptions::default())
        .acquire(&CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(AgentError::Protocol(ProtocolError::PlaintextEnforced))
    ));
    let summary: Summary = summary::summarize(&config, "web01", &result);
    assert_eq!(summary.state, ServiceState::Unknown);
    assert!(summary.output.contains("encryption is enforced"));
}

#[tokio::test]
async fn wrong_passphrase_is_a_soft_failure_under_allow() {
    let agent: MockAgent = MockAgent::serving(&encrypted(PLAIN_OUTPUT, "other")).await;
    let dir = tempfile::tempdir().unwrap();
    let config: Config = config_for(
        dir.path(),
        &[("web01", agent.port(), "encryption = { mode = \"allow\", passphrase = \"s3cr3t\" }")],
    );

    // Wrong passphrase still "decrypts": the result is garbage, not an error.
    let acquisition: Acquisition = source(&config, "web01", AcquisitionOptions::default())
        .acquire(&CancellationToken::new())
        .await
        .unwrap();
    assert_ne!(acquisition.payload, PLAIN_OUTPUT);
}

#[tokio::test]
async fn empty_and_short_agents_are_told_apart() {
    let empty: MockAgent = MockAgent::serving(b"").await;
    let short: MockAgent = MockAgent::serving(b"<<<check_mk>>>\n").await;
    let dir = tempfile::tempdir().unwrap();
    let config: Config = config_for(
        dir.path(),
        &[("empty", empty.port(), ""), ("short", short.port(), "")],
    );

    let result = source(&config, "empty", AcquisitionOptions::default())
        .acquire(&CancellationToken::new())
        .await;
    assert!(matches!(result, Err(AgentError::EmptyData { port }) if port == empty.port()));
    assert_eq!(summary::summarize(&config, "empty", &result).state, ServiceState::Crit);

    let result = source(&config, "short", AcquisitionOptions::default())
        .acquire(&CancellationToken::new())
        .await;
    assert!(matches!(
        result,
        Err(AgentError::Protocol(ProtocolError::TooShort(_)))
    ));
}

#[tokio::test]
async fn cache_modes_avoid_the_network() {
    let agent: MockAgent = MockAgent::serving(PLAIN_OUTPUT).await;
    let dir = tempfile::tempdir().unwrap();
    let config: Config = config_for(dir.path(), &[("web01", agent.port(), "")]);

    let err = source(&config, "web01", CACHE_ONLY)
        .acquire(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::CacheUnavailable { .. }));
    assert!(err.to_string().contains(&dir.path().join("web01").display().to_string()));
    assert_eq!(agent.connections(), 0);

    source(&config, "web01", AcquisitionOptions::default())
        .acquire(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(agent.connections(), 1);

    let use_cache = AcquisitionOptions {
        use_cache: true,
        cache_only: false,
    };
    for options in [CACHE_ONLY, use_cache] {
        let acquisition: Acquisition = source(&config, "web01", options)
            .acquire(&CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(acquisition.source, PayloadSource::Cache { .. }));
        assert_eq!(acquisition.payload, PLAIN_OUTPUT);
    }
    assert_eq!(agent.connections(), 1);
}

#[tokio::test]
async fn cancellation_reaches_the_caller_unwrapped() {
    let agent: MockAgent = MockAgent::stalling(b"<<<check_mk>>>\nVersion: 1.2.5i4\n").await;
    let dir = tempfile::tempdir().unwrap();
    let config: Config = config_for(dir.path(), &[("web01", agent.port(), "")]);

    let cancel: CancellationToken = CancellationToken::new();
    let trigger: CancellationToken = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = source(&config, "web01", AcquisitionOptions::default())
        .acquire(&cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Cancelled));
    assert!(!dir.path().join("web01").exists());
}

#[tokio::test]
async fn pool_checks_a_fleet() {
    let current: MockAgent = MockAgent::serving(PLAIN_OUTPUT).await;
    let outdated: MockAgent =
        MockAgent::serving(b"<<<check_mk>>>\nVersion: 1.2.3\nAgentOS: linux\n").await;
    let silent: MockAgent = MockAgent::serving(b"").await;
    let dir = tempfile::tempdir().unwrap();
    let expectation: &str = "target_version = { at_least = { release = \"1.2.4\" } }";
    let config: Config = config_for(
        dir.path(),
        &[
            ("current", current.port(), expectation),
            ("outdated", outdated.port(), expectation),
            ("silent", silent.port(), ""),
        ],
    );

    let sources: Vec<TcpDataSource> = ["current", "outdated", "silent"]
        .iter()
        .map(|host| source(&config, host, AcquisitionOptions::default()))
        .collect();
    let outcomes: Vec<HostOutcome> = pool::acquire_all(sources, 2, &CancellationToken::new())
        .await
        .unwrap();

    let verdicts: Vec<(String, ServiceState)> = outcomes
        .iter()
        .map(|o| {
            let summary: Summary = summary::summarize(&config, &o.hostname, &o.result);
            (o.hostname.clone(), summary.state)
        })
        .collect();
    assert_eq!(
        verdicts,
        [
            ("current".to_string(), ServiceState::Ok),
            ("outdated".to_string(), ServiceState::Warn),
            ("silent".to_string(), ServiceState::Crit),
        ]
    );

    let outdated_summary: Summary = summary::summarize(&config, "outdated", &outcomes[1].result);
    assert!(outdated_summary
        .output
        .ends_with(", unexpected agent version 1.2.3 (should be at least release 1.2.4)"));
}
