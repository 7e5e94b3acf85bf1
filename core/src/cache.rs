//! Per-host cache of the last raw agent output.
//!
//! One file per host holds the bytes exactly as received (before decryption);
//! its modification time is the entry's timestamp. Entries are replaced, never
//! edited: a write goes to a temporary file in the same directory which is then
//! renamed over the old entry, so a concurrent reader sees either the old or
//! the new file, never a mix.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use agentlink_common::MIN_OUTPUT_LEN;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub hostname: String,
    pub payload: Vec<u8>,
    pub written_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Cache entries only ever come from validated fetches; anything shorter
    /// was truncated or written by something else.
    fn is_usable(&self) -> bool {
        self.payload.len() >= MIN_OUTPUT_LEN
    }
}

#[derive(Debug, Clone)]
pub struct AgentCache {
    dir: PathBuf,
}

impl AgentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `hostname`'s entry lives.
    ///
    /// Path separators and `%` are percent-encoded, as are the dots of `.`
    /// and `..`, so every host name maps to its own file inside the cache
    /// directory.
    pub fn path_of(&self, hostname: &str) -> PathBuf {
        let file_name: String = match hostname {
            "" => "%".to_string(),
            "." | ".." => hostname.replace('.', "%2E"),
            _ => hostname
                .chars()
                .fold(String::with_capacity(hostname.len()), |mut out, c| {
                    match c {
                        '%' => out.push_str("%25"),
                        '/' => out.push_str("%2F"),
                        '\\' => out.push_str("%5C"),
                        _ => out.push(c),
                    }
                    out
                }),
        };
        self.dir.join(file_name)
    }

    /// Reads the entry for `hostname`, or `None` when there is none or it is not usable.
    pub async fn read(&self, hostname: &str) -> Option<CacheEntry> {
        let path: PathBuf = self.path_of(hostname);

        let payload: Vec<u8> = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(host = hostname, path = %path.display(), "No cache entry");
                return None;
            }
            Err(e) => {
                warn!(host = hostname, path = %path.display(), error = %e, "Cannot read cache entry");
                return None;
            }
        };

        let written_at: DateTime<Utc> = tokio::fs::metadata(&path)
            .await
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH));

        let entry: CacheEntry = CacheEntry {
            hostname: hostname.to_string(),
            payload,
            written_at,
        };

        if !entry.is_usable() {
            warn!(host = hostname, bytes = entry.payload.len(), "Ignoring truncated cache entry");
            return None;
        }

        debug!(host = hostname, bytes = entry.payload.len(), written_at = %entry.written_at, "Using cache entry");
        Some(entry)
    }

    /// Atomically replaces the entry for `hostname` with `payload`.
    pub async fn write(&self, hostname: &str, payload: &[u8]) -> io::Result<()> {
        let dir: PathBuf = self.dir.clone();
        let path: PathBuf = self.path_of(hostname);
        let payload: Vec<u8> = payload.to_vec();
        let bytes: usize = payload.len();

        tokio::task::spawn_blocking(move || write_atomically(&dir, &path, &payload))
            .await
            .map_err(io::Error::other)??;

        debug!(host = hostname, bytes, "Cache entry written");
        Ok(())
    }
}

fn write_atomically(dir: &Path, path: &Path, payload: &[u8]) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp: NamedTempFile = NamedTempFile::new_in(dir)?;
    tmp.write_all(payload)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
