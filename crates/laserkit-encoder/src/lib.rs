//! # LaserKit Encoder
//!
//! Turns a [`laserkit_core::LaserJob`] into a device instruction stream.
//!
//! The raster side is a boustrophedon scan-line toolpath generator: each
//! raster region is walked line by line, alternating direction, and every
//! line is reduced to laser-on runs separated by non-printing moves. The
//! vector side renders the job's ordered command stream directly. Both
//! feed one of two instruction dialects (the LAOS simple code or a G-code
//! subset) through a per-pass state minimizer that suppresses redundant
//! power/speed/frequency instructions.

pub mod dialect;
pub mod encoder;
pub mod raster;
pub mod state;
pub mod transform;

pub use dialect::{Dialect, GcodeFormat, InstructionFormat, SimpleFormat};
pub use encoder::{EncoderConfig, JobEncoder};
pub use raster::{extract_runs, scaled_power, Run};
pub use state::PassState;
pub use transform::Transform;
