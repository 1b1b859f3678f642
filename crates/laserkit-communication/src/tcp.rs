//! Stream delivery over TCP
//!
//! Opens a connection to the controller with a bounded connect timeout
//! and writes the encoded blocks as they arrive. There is no
//! acknowledgment protocol: a failure at any write stage aborts the
//! whole send, and bytes already written are not rolled back on the
//! remote side.

use laserkit_core::{Result, TransportError};
use std::io::{self, BufWriter, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::transport::Transport;

/// Bounded connect timeout for the stream strategy.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Persistent stream connection to the controller board.
pub struct StreamTransport {
    host: String,
    port: u16,
    connect_timeout: Duration,
    stream: Option<BufWriter<TcpStream>>,
}

impl StreamTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_timeout(host, port, DEFAULT_CONNECT_TIMEOUT)
    }

    /// A transport with a custom connect timeout, mainly for tests.
    pub fn with_timeout(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
            stream: None,
        }
    }

    fn resolve(&self) -> std::result::Result<SocketAddr, TransportError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| TransportError::Resolve {
                host: self.host.clone(),
            })?
            .next()
            .ok_or_else(|| TransportError::Resolve {
                host: self.host.clone(),
            })
    }
}

impl Transport for StreamTransport {
    fn begin(&mut self) -> Result<()> {
        let addr = self.resolve()?;
        tracing::debug!("connecting to {} (timeout {:?})", addr, self.connect_timeout);
        let stream = TcpStream::connect_timeout(&addr, self.connect_timeout).map_err(|e| {
            if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
                TransportError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout_ms: self.connect_timeout.as_millis() as u64,
                }
            } else {
                TransportError::Io(e)
            }
        })?;
        self.stream = Some(BufWriter::new(stream));
        Ok(())
    }

    fn write_block(&mut self, block: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        stream.write_all(block)?;
        Ok(())
    }

    fn finish(&mut self, _remote_name: &str) -> Result<()> {
        let mut stream = self.stream.take().ok_or(TransportError::NotConnected)?;
        stream.flush()?;
        stream.get_ref().shutdown(Shutdown::Both)?;
        tracing::debug!("stream to {}:{} closed", self.host, self.port);
        Ok(())
    }
}
