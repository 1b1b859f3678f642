//! # LaserKit
//!
//! A job sender for networked laser cutter controllers. Takes an
//! abstract cutting job (vector paths plus raster regions annotated with
//! power/speed/frequency/focus), encodes it into a device instruction
//! stream, and delivers the stream to the board.
//!
//! ## Architecture
//!
//! LaserKit is organized as a workspace with multiple crates:
//!
//! 1. **laserkit-core** - job model, units, errors, progress contract
//! 2. **laserkit-encoder** - scan-line rasterizer, dialects, state
//!    minimizer
//! 3. **laserkit-communication** - TCP stream and TFTP block transports
//! 4. **laserkit-driver** - device configuration and the LAOS driver
//! 5. **laserkit** - this crate: re-exports and the CLI binary
//!
//! ## Features
//!
//! - **Boustrophedon rasterization**: serpentine scan with per-line run
//!   extraction and acceleration padding
//! - **Two dialects**: the LAOS simple code (motor steps) and a G-code
//!   subset (millimeters)
//! - **Minimal-redundancy output**: power/speed/frequency written only
//!   when they change within a pass
//! - **Two transports**: persistent TCP stream, or buffer-then-push
//!   TFTP file transfer

pub use laserkit_communication::{BlockTransport, StreamTransport, Transport, TransportKind};
pub use laserkit_core::{
    Error, JobError, LaserJob, LaserProperty, NullProgress, Point, ProgressListener,
    Raster3dPart, RasterPart, Result, VectorPart,
};
pub use laserkit_driver::{Device, DeviceConfig, LaosDevice};
pub use laserkit_encoder::{Dialect, EncoderConfig, JobEncoder};

/// Initialize the tracing subscriber.
///
/// - Console output with level and target
/// - `RUST_LOG` environment variable support, default level INFO
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
