use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use agentlink_common::MIN_OUTPUT_LEN;
use agentlink_common::error::{AgentError, ProtocolError, Result};
use agentlink_common::network::target::{AddressFamily, HostTarget};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::network::transport::Transport;

const CHUNK_SIZE: usize = 4096;

/// Plain TCP agent transport: connect, read until the agent hangs up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport {
    /// Propagate raw socket errors instead of wrapping them.
    debug: bool,
}

impl TcpTransport {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    fn communication_error(&self, err: io::Error) -> AgentError {
        if self.debug {
            AgentError::Socket(err)
        } else {
            AgentError::Communication(err)
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn fetch(&self, target: &HostTarget, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let ip: IpAddr = target
            .address
            .ok_or_else(|| AgentError::NoIpAddress(target.hostname.clone()))?;
        let addr: SocketAddr = SocketAddr::new(ip, target.port);

        debug!(
            host = %target.hostname,
            %addr,
            timeout = ?target.connect_timeout,
            "Connecting via TCP"
        );

        // Dropping the losing branch drops the stream, which closes the socket.
        let output: Vec<u8> = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            res = connect_and_read(target, addr) => res.map_err(|e| self.communication_error(e))?,
        };

        debug!(host = %target.hostname, bytes = output.len(), "Agent closed connection");
        validate_output(output, target.port)
    }
}

async fn connect_and_read(target: &HostTarget, addr: SocketAddr) -> io::Result<Vec<u8>> {
    let socket: TcpSocket = match target.family {
        AddressFamily::V4 => TcpSocket::new_v4()?,
        AddressFamily::V6 => TcpSocket::new_v6()?,
    };

    let mut stream: TcpStream = within(target.connect_timeout, socket.connect(addr)).await?;

    debug!(host = %target.hostname, "Reading data from agent");
    match target.read_timeout {
        Some(limit) => within(limit, read_until_eof(&mut stream)).await,
        None => read_until_eof(&mut stream).await,
    }
}

async fn within<T, F>(limit: Duration, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match timeout(limit, fut).await {
        Ok(res) => res,
        Err(_elapsed) => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
    }
}

async fn read_until_eof(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut output: Vec<u8> = Vec::new();
    let mut chunk: [u8; CHUNK_SIZE] = [0u8; CHUNK_SIZE];

    loop {
        let filled: usize = read_full(stream, &mut chunk).await?;
        output.extend_from_slice(&chunk[..filled]);
        // A short chunk means EOF arrived while filling it.
        if filled < CHUNK_SIZE {
            return Ok(output);
        }
    }
}

/// Fills `buf` completely unless the peer closes first.
async fn read_full(stream: &mut TcpStream, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled: usize = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Rejects agent output that cannot be a usable payload.
pub fn validate_output(output: Vec<u8>, port: u16) -> Result<Vec<u8>> {
    match output.len() {
        // Usually xinetd/only_from refusing our address.
        0 => Err(AgentError::EmptyData { port }),
        n if n < MIN_OUTPUT_LEN => Err(ProtocolError::TooShort(output).into()),
        _ => Ok(output),
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
