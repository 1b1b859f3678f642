//! Block delivery over TFTP
//!
//! The whole job is buffered in memory first, so dialect output is never
//! interleaved with network I/O, then pushed to the controller as a
//! single named file with a TFTP write request (RFC 1350, octet mode).
//! The exchange is lock-step: every 512-byte data block must be
//! acknowledged before the next one goes out. A timeout after the
//! bounded retransmits, or an error packet from the remote, is fatal;
//! the buffer is discarded either way.

use laserkit_core::{Result, TransportError};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use crate::transport::Transport;

/// Bounded per-exchange timeout for the block strategy.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(5);

const BLOCK_SIZE: usize = 512;
const MAX_RETRANSMITS: u32 = 3;

const OP_WRQ: u16 = 2;
const OP_DATA: u16 = 3;
const OP_ACK: u16 = 4;
const OP_ERROR: u16 = 5;

/// Buffer-then-push delivery to the controller board.
pub struct BlockTransport {
    host: String,
    port: u16,
    timeout: Duration,
    buffer: Vec<u8>,
}

impl BlockTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_timeout(host, port, DEFAULT_TRANSFER_TIMEOUT)
    }

    /// A transport with a custom exchange timeout, mainly for tests.
    pub fn with_timeout(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            buffer: Vec::new(),
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

    /// Push `payload` to the server as `name`.
    fn push_file(&self, name: &str, payload: &[u8]) -> std::result::Result<(), TransportError> {
        let server = self.resolve()?;
        let socket = match server {
            SocketAddr::V4(_) => UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?,
            SocketAddr::V6(_) => UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0))?,
        };
        socket.set_read_timeout(Some(self.timeout))?;

        tracing::debug!("pushing {} bytes to {} as {}", payload.len(), server, name);

        let mut wrq = vec![0, OP_WRQ as u8];
        wrq.extend_from_slice(name.as_bytes());
        wrq.push(0);
        wrq.extend_from_slice(b"octet");
        wrq.push(0);

        // the ACK for the write request arrives from the server's
        // transfer port; all data blocks go there
        let mut remote: Option<SocketAddr> = None;
        self.exchange(&socket, &wrq, 0, server, &mut remote)?;

        let mut block_num: u16 = 1;
        let mut offset = 0;
        loop {
            let end = payload.len().min(offset + BLOCK_SIZE);
            let chunk = &payload[offset..end];
            let mut data = vec![0, OP_DATA as u8, (block_num >> 8) as u8, block_num as u8];
            data.extend_from_slice(chunk);
            let dest = remote.unwrap_or(server);
            self.exchange(&socket, &data, block_num, dest, &mut remote)?;
            offset = end;
            // a short final block terminates the transfer
            if chunk.len() < BLOCK_SIZE {
                break;
            }
            block_num = block_num.wrapping_add(1);
        }
        tracing::info!("transferred {} ({} bytes)", name, payload.len());
        Ok(())
    }

    /// Send one packet and wait for its acknowledgment, retransmitting a
    /// bounded number of times before giving up.
    fn exchange(
        &self,
        socket: &UdpSocket,
        packet: &[u8],
        expect_block: u16,
        dest: SocketAddr,
        remote: &mut Option<SocketAddr>,
    ) -> std::result::Result<(), TransportError> {
        let mut buf = [0u8; 1024];
        for _ in 0..=MAX_RETRANSMITS {
            socket.send_to(packet, dest)?;
            match socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    if n < 4 {
                        return Err(TransportError::Protocol(format!(
                            "short packet ({} bytes)",
                            n
                        )));
                    }
                    let op = u16::from_be_bytes([buf[0], buf[1]]);
                    match op {
                        OP_ACK => {
                            let block = u16::from_be_bytes([buf[2], buf[3]]);
                            if block == expect_block {
                                *remote = Some(from);
                                return Ok(());
                            }
                            // stale duplicate; fall through and resend
                        }
                        OP_ERROR => {
                            let code = u16::from_be_bytes([buf[2], buf[3]]);
                            let text = buf[4..n]
                                .split(|&b| b == 0)
                                .next()
                                .unwrap_or_default();
                            return Err(TransportError::Rejected {
                                code,
                                message: String::from_utf8_lossy(text).into_owned(),
                            });
                        }
                        other => {
                            return Err(TransportError::Protocol(format!(
                                "unexpected opcode {}",
                                other
                            )));
                        }
                    }
                }
                Err(e)
                    if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
                {
                    tracing::warn!("no acknowledgment for block {}, retransmitting", expect_block);
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Err(TransportError::TransferTimeout {
            timeout_ms: self.timeout.as_millis() as u64,
            block: expect_block,
        })
    }
}

impl Transport for BlockTransport {
    fn begin(&mut self) -> Result<()> {
        self.buffer.clear();
        Ok(())
    }

    fn write_block(&mut self, block: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(block);
        Ok(())
    }

    fn finish(&mut self, remote_name: &str) -> Result<()> {
        // the buffer is consumed whether the push succeeds or not
        let payload = std::mem::take(&mut self.buffer);
        self.push_file(remote_name, &payload)?;
        Ok(())
    }
}
