//! Shared types for the agentlink poller: configuration, the per-host poll
//! target, agent version strings and the acquisition error taxonomy.

pub mod config;
pub mod error;
pub mod state;
pub mod version;

pub mod network {
    pub mod target;
}

/// Marker that opens every plaintext agent section.
pub const PLAINTEXT_MARKER: &[u8] = b"<<<";

/// Shortest agent output accepted as a valid payload.
pub const MIN_OUTPUT_LEN: usize = 16;
