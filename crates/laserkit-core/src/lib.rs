//! # LaserKit Core
//!
//! Core types, traits, and utilities for LaserKit.
//! Provides the job model consumed by the encoder, unit conversions
//! between device pixels, millimeters and motor steps, the unified
//! error type, and the progress listener contract.

pub mod error;
pub mod job;
pub mod progress;
pub mod units;

pub use error::{ConfigError, Error, JobError, Result, TransportError};
pub use job::{
    LaserJob, LaserProperty, Point, Raster3dPart, RasterPart, VectorCommand, VectorPart,
};
pub use progress::{NullProgress, ProgressListener};
