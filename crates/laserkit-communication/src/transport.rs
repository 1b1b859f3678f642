//! The transport contract
//!
//! Both delivery strategies implement the same narrow interface: the
//! driver begins a send, writes the encoded blocks in device order, and
//! finishes with the job's remote name. What happens underneath differs:
//! the stream strategy writes to the socket as blocks arrive, the block
//! strategy accumulates everything in memory and pushes the buffer as a
//! single named file at the end.

use laserkit_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivers one encoded job to the controller board.
pub trait Transport {
    /// Prepare the send. The stream strategy connects here; the block
    /// strategy resets its buffer.
    fn begin(&mut self) -> Result<()>;

    /// Hand over one encoded block in device order.
    fn write_block(&mut self, block: &[u8]) -> Result<()>;

    /// Complete the send. `remote_name` is the file name used on the
    /// remote side by the block strategy; the stream strategy ignores
    /// it.
    fn finish(&mut self, remote_name: &str) -> Result<()>;
}

/// Which delivery strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Persistent stream connection to the controller.
    Tcp,
    /// Buffer the whole job, then push it as a named file.
    Tftp,
}

impl Default for TransportKind {
    fn default() -> Self {
        Self::Tftp
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Tftp => write!(f, "tftp"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" | "stream" => Ok(Self::Tcp),
            "tftp" => Ok(Self::Tftp),
            _ => Err(format!("Unknown transport: {}", s)),
        }
    }
}
