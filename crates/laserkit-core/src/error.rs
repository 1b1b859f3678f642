//! Error handling for LaserKit
//!
//! Provides error types for all layers of the job pipeline:
//! - Job errors (validity checks before encoding)
//! - Config errors (device configuration parsing and persistence)
//! - Transport errors (stream and block-transfer delivery)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Job validity error type
///
/// Raised by the pre-encoding job check. A job failing this check is
/// rejected before a single instruction is generated or sent.
#[derive(Error, Debug, Clone)]
pub enum JobError {
    /// The job's resolution is not offered by the device
    #[error("Resolution {dpi} dpi is not supported by this device")]
    UnsupportedResolution {
        /// The requested resolution in dots per inch.
        dpi: u32,
    },

    /// A job part does not fit on the laser bed
    #[error("{part} part exceeds the laser bed: {detail}")]
    OutOfBed {
        /// Which part violated the bed limits ("vector", "raster", "raster3d").
        part: &'static str,
        /// Human-readable description of the violation.
        detail: String,
    },

    /// The job contains nothing to cut or engrave
    #[error("Job contains no vector or raster parts")]
    Empty,
}

/// Device configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting value could not be parsed
    #[error("Invalid value '{value}' for setting '{key}'")]
    InvalidValue {
        /// The setting key.
        key: String,
        /// The offending value.
        value: String,
    },

    /// A configuration field holds an out-of-range value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Configuration file has an unsupported extension
    #[error("Config file must be .json or .toml: {0}")]
    UnsupportedFormat(String),

    /// I/O error while reading or writing a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport error type
///
/// Represents failures while delivering the encoded byte stream to the
/// controller board over the stream or block-transfer strategy.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not resolve the configured hostname
    #[error("Failed to resolve host {host}")]
    Resolve {
        /// The hostname or IP that failed to resolve.
        host: String,
    },

    /// Connecting to the controller timed out
    #[error("Connection to {addr} timed out after {timeout_ms}ms")]
    ConnectTimeout {
        /// The remote address.
        addr: String,
        /// The timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The lock-step block transfer timed out waiting for the remote
    #[error("Transfer timed out after {timeout_ms}ms waiting for block {block}")]
    TransferTimeout {
        /// The timeout in milliseconds.
        timeout_ms: u64,
        /// The block number that was never acknowledged.
        block: u16,
    },

    /// The remote rejected the transfer with a protocol error packet
    #[error("Transfer rejected by remote: error {code}: {message}")]
    Rejected {
        /// The protocol error code.
        code: u16,
        /// The error message sent by the remote.
        message: String,
    },

    /// The remote sent a packet that violates the protocol
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// The transport was used before a connection was established
    #[error("Transport is not connected")]
    NotConnected,

    /// I/O error on the underlying socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main error type for LaserKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Job validity error
    #[error(transparent)]
    Job(#[from] JobError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Transport(TransportError::ConnectTimeout { .. })
                | Error::Transport(TransportError::TransferTimeout { .. })
        )
    }

    /// Check if this is a transport error
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this is a job validity error
    pub fn is_job_error(&self) -> bool {
        matches!(self, Error::Job(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JobError::UnsupportedResolution { dpi: 300 };
        assert_eq!(
            err.to_string(),
            "Resolution 300 dpi is not supported by this device"
        );

        let err = ConfigError::InvalidValue {
            key: "Port".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value 'abc' for setting 'Port'");
    }

    #[test]
    fn test_error_conversion() {
        let job_err = JobError::Empty;
        let err: Error = job_err.into();
        assert!(err.is_job_error());

        let transport_err = TransportError::NotConnected;
        let err: Error = transport_err.into();
        assert!(err.is_transport_error());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_other_helper() {
        let err = Error::other("send already in flight");
        assert_eq!(err.to_string(), "send already in flight");
        assert!(!err.is_transport_error());
    }

    #[test]
    fn test_timeout_predicate() {
        let err: Error = TransportError::ConnectTimeout {
            addr: "10.0.0.1:69".to_string(),
            timeout_ms: 3000,
        }
        .into();
        assert!(err.is_timeout());

        let err: Error = TransportError::TransferTimeout {
            timeout_ms: 5000,
            block: 7,
        }
        .into();
        assert!(err.is_timeout());
    }
}
