//! # LaserKit Communication
//!
//! Delivery strategies for the encoded instruction stream. The
//! controller board accepts a job either over a persistent TCP stream
//! or as a named file pushed with a lock-step TFTP write.
//!
//! Everything here is synchronous and blocking; the whole send runs on
//! the caller's thread and a failure at any stage aborts the job.

pub mod tcp;
pub mod tftp;
pub mod transport;

pub use tcp::{StreamTransport, DEFAULT_CONNECT_TIMEOUT};
pub use tftp::{BlockTransport, DEFAULT_TRANSFER_TIMEOUT};
pub use transport::{Transport, TransportKind};
