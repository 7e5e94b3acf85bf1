use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use agentlink_common::config::Config;
use agentlink_protocols::crypto::encrypt_package;
use agentlink_protocols::envelope::{seal, CURRENT_VERSION};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const PLAIN_OUTPUT: &[u8] =
    b"<<<check_mk>>>\nVersion: 1.2.5i4\nAgentOS: linux\n<<<uptime>>>\n123456\n";

/// A fake agent: writes `payload` to every connection, then optionally
/// keeps the connection open for `linger` before hanging up.
pub struct MockAgent {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockAgent {
    pub async fn serving(payload: &[u8]) -> Self {
        Self::start(payload.to_vec(), Duration::ZERO).await
    }

    /// Sends `prefix` and then stalls instead of closing.
    pub async fn stalling(prefix: &[u8]) -> Self {
        Self::start(prefix.to_vec(), Duration::from_secs(30)).await
    }

    async fn start(payload: Vec<u8>, linger: Duration) -> Self {
        let listener: TcpListener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let connections: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));

        let counter = connections.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut conn, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let payload = payload.clone();
                tokio::spawn(async move {
                    let _ = conn.write_all(&payload).await;
                    if !linger.is_zero() {
                        tokio::time::sleep(linger).await;
                    }
                });
            }
        });

        Self {
            addr,
            connections,
            handle,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockAgent {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn encrypted(plain: &[u8], passphrase: &str) -> Vec<u8> {
    seal(CURRENT_VERSION, &encrypt_package(plain, passphrase))
}

/// Configuration with one loopback host per `(name, port, extra)` entry, where
/// `extra` is TOML appended to that host's table.
pub fn config_for(cache_dir: &Path, hosts: &[(&str, u16, &str)]) -> Config {
    let mut toml: String = format!("cache_dir = {:?}\n", cache_dir.display().to_string());
    for (name, port, extra) in hosts {
        toml.push_str(&format!(
            "[hosts.{name}]\naddress = \"127.0.0.1\"\nport = {port}\n{extra}\n"
        ));
    }
    Config::from_toml(&toml).unwrap()
}
