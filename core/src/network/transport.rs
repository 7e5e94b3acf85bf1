use agentlink_common::error::Result;
use agentlink_common::network::target::HostTarget;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Fetches the raw agent output for one host.
///
/// Implementations must return [`AgentError::Cancelled`] as soon as `cancel`
/// fires and release every socket they opened on all exit paths.
///
/// [`AgentError::Cancelled`]: agentlink_common::error::AgentError::Cancelled
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, target: &HostTarget, cancel: &CancellationToken) -> Result<Vec<u8>>;
}
