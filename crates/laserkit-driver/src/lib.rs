//! # LaserKit Driver
//!
//! The top of the pipeline: device configuration with its string-keyed
//! settings surface, the [`Device`] capability contract a host
//! application programs against, and the concrete driver for the LAOS
//! lasercutter board that encodes a job and delivers it over the
//! configured transport.

pub mod config;
pub mod device;
pub mod laos;

pub use config::{
    DeviceConfig, SETTING_BEDHEIGHT, SETTING_BEDWIDTH, SETTING_FLIPX, SETTING_GCODE,
    SETTING_HOSTNAME, SETTING_MMPERSTEP, SETTING_PORT, SETTING_RASTER_PADDING, SETTING_TFTP,
};
pub use device::Device;
pub use laos::LaosDevice;
