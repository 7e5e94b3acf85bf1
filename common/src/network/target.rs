//! # Poll Target Model
//!
//! A [`HostTarget`] is everything the transport needs to reach one agent:
//! where to connect, which address family to open the socket with and how
//! long to wait. It is resolved once per acquisition attempt from the
//! run's [`Config`] plus whatever the caller overrides.

use std::net::IpAddr;
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

/// Explicit per-request settings that win over configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetOverrides {
    pub port: Option<u16>,
    /// A zero timeout counts as unset.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    pub hostname: String,
    pub address: Option<IpAddr>,
    pub family: AddressFamily,
    pub port: u16,
    pub connect_timeout: Duration,
    pub read_timeout: Option<Duration>,
}

impl HostTarget {
    /// Resolves the target for `hostname`. Never fails: anything missing from
    /// the configuration falls back to the global defaults.
    pub fn resolve(
        config: &Config,
        hostname: &str,
        address: Option<IpAddr>,
        overrides: TargetOverrides,
    ) -> Self {
        let family: AddressFamily = if config.is_ipv6_primary(hostname) {
            AddressFamily::V6
        } else {
            AddressFamily::V4
        };

        Self {
            hostname: hostname.to_string(),
            address: address.or_else(|| config.address_of(hostname)),
            family,
            port: overrides.port.unwrap_or_else(|| config.agent_port_of(hostname)),
            connect_timeout: overrides
                .timeout
                .filter(|t| !t.is_zero())
                .unwrap_or_else(|| config.tcp_connect_timeout_of(hostname)),
            read_timeout: config.read_timeout_of(hostname),
        }
    }

    /// `TCP: <address>:<port>`, for logs and summaries.
    pub fn describe(&self) -> String {
        match self.address {
            Some(IpAddr::V6(ip)) => format!("TCP: [{ip}]:{}", self.port),
            Some(IpAddr::V4(ip)) => format!("TCP: {ip}:{}", self.port),
            None => format!("TCP: {}:{}", self.hostname, self.port),
        }
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
