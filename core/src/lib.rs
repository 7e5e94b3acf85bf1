//! Agent acquisition: fetch over TCP or serve from cache, negotiate
//! encryption, check the agent version and summarize the outcome.

pub mod agent_info;
pub mod cache;
pub mod data_source;
pub mod negotiator;
pub mod pool;
pub mod summary;
pub mod version_check;

pub mod network {
    pub mod tcp;
    pub mod transport;
}
