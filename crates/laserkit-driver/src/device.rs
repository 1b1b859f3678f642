//! The device capability contract
//!
//! A host application drives a cutter through this trait alone:
//! configuration accessors, the job validity check, the send operation,
//! a duration estimate, the supported resolutions, and cloning. The
//! concrete driver behind it owns dialect and transport selection.

use laserkit_core::{LaserJob, ProgressListener, Result};
use std::time::Duration;

/// One physical cutter the host can send jobs to.
///
/// `send_job` runs synchronously on the caller's thread and blocks on
/// network I/O; concurrent sends against one device must be serialized
/// by the caller.
pub trait Device {
    /// Short model name for display.
    fn model_name(&self) -> &'static str;

    /// Laser bed width in millimeters.
    fn bed_width(&self) -> f64;

    /// Laser bed height in millimeters.
    fn bed_height(&self) -> f64;

    /// Resolutions (dpi) the device accepts.
    fn resolutions(&self) -> Vec<u32>;

    /// Rough wall-clock estimate for running `job`.
    fn estimate_duration(&self, job: &LaserJob) -> Duration;

    /// Validate `job` against the device constraints. Called by
    /// `send_job` before any instruction is generated; a failure aborts
    /// the send.
    fn check_job(&self, job: &LaserJob) -> Result<()>;

    /// Encode `job` and deliver it. Progress milestones are reported
    /// synchronously through `progress`.
    fn send_job(&self, job: &LaserJob, progress: &mut dyn ProgressListener) -> Result<()>;

    /// An independent copy of this device.
    fn clone_device(&self) -> Box<dyn Device>;

    /// Keys of the string-keyed settings surface.
    fn setting_keys(&self) -> &'static [&'static str];

    /// Read one setting as a string.
    fn setting(&self, key: &str) -> Option<String>;

    /// Write one setting from a string.
    fn set_setting(&mut self, key: &str, value: &str) -> Result<()>;
}
