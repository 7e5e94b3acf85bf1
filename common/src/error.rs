use std::fmt;
use std::io;
use std::path::PathBuf;

/// Everything that can go wrong while acquiring agent output for one host.
///
/// Apart from [`AgentError::Cancelled`], every variant is scoped to a single
/// host: it fails that host's acquisition and nothing else.
///
/// # Examples
///
/// ```rust
/// use agentlink_common::error::AgentError;
///
/// let err = AgentError::EmptyData { port: 6556 };
/// assert!(err.to_string().contains("6556"));
/// assert_eq!(err.category(), "empty_output");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Connecting to or reading from the agent failed.
    #[error("Communication failed: {0}")]
    Communication(#[source] io::Error),

    /// Raw socket error, only produced in debug mode instead of `Communication`.
    #[error(transparent)]
    Socket(io::Error),

    /// The host has no IP address to connect to.
    #[error("Host {0} has no IP address configured")]
    NoIpAddress(String),

    /// The agent closed the connection without sending anything. Usually an
    /// access-control rejection (e.g. `only_from`) rather than a network fault.
    #[error("Empty output from agent at TCP port {port}")]
    EmptyData { port: u16 },

    /// The payload violates the wire format or the encryption policy.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Decryption failed while encryption is enforced.
    #[error("Failed to decrypt agent output: {0}")]
    Decryption(String),

    /// Cache-only mode was requested but there is no usable cache entry.
    #[error("Got no data: No usable cache file present at {}", .path.display())]
    CacheUnavailable { path: PathBuf },

    /// The version expectation could not be evaluated.
    #[error("{0}")]
    Configuration(String),

    /// Cooperative shutdown. Never wrapped, never swallowed.
    #[error("Acquisition cancelled")]
    Cancelled,
}

impl AgentError {
    /// Key into the exit-code table used when summarizing this failure.
    pub fn category(&self) -> &'static str {
        match self {
            AgentError::Communication(e) | AgentError::Socket(e)
                if e.kind() == io::ErrorKind::TimedOut =>
            {
                "timeout"
            }
            AgentError::Communication(_) | AgentError::Socket(_) | AgentError::NoIpAddress(_) => {
                "connection"
            }
            AgentError::EmptyData { .. } => "empty_output",
            _ => "exception",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Too short output from agent: {}", Printable(.0))]
    TooShort(Vec<u8>),

    #[error("Unsupported protocol version: {}", Printable(.0))]
    UnsupportedVersion(Vec<u8>),

    #[error("Agent output is plaintext but encryption is enforced by configuration")]
    PlaintextEnforced,
}

/// Renders bytes like a byte-string literal, escaping anything non-printable.
struct Printable<'a>(&'a [u8]);

impl fmt::Display for Printable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b\"")?;
        for byte in self.0 {
            write!(f, "{}", byte.escape_ascii())?;
        }
        write!(f, "\"")
    }
}

/// Convenience `Result` alias for acquisition operations.
pub type Result<T> = std::result::Result<T, AgentError>;

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
