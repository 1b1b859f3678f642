//! Driver for the LAOS lasercutter board
//!
//! Encodes one job into the configured dialect and delivers it over the
//! configured transport, reporting milestones as it goes. The board
//! speaks the simple code natively; the G-code dialect is kept for
//! firmware that may use it.

use laserkit_communication::{BlockTransport, StreamTransport, Transport, TransportKind};
use laserkit_core::job::VectorCommand;
use laserkit_core::units;
use laserkit_core::{JobError, LaserJob, Point, ProgressListener, Result, VectorPart};
use laserkit_encoder::{extract_runs, EncoderConfig, JobEncoder};
use std::time::Duration;

use crate::config::DeviceConfig;
use crate::device::Device;

/// Nominal head travel speed at 100% commanded speed, used for the
/// duration estimate.
const FULL_SPEED_MM_S: f64 = 100.0;

/// The LAOS board driver.
#[derive(Debug, Clone, Default)]
pub struct LaosDevice {
    config: DeviceConfig,
}

impl LaosDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DeviceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DeviceConfig {
        &mut self.config
    }

    fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            dialect: self.config.dialect,
            bed_width: self.config.bed_width,
            flip_x: self.config.flip_x,
            mm_per_step: self.config.mm_per_step,
            raster_padding: self.config.raster_padding,
        }
    }

    fn make_transport(&self) -> Box<dyn Transport> {
        match self.config.transport {
            TransportKind::Tcp => Box::new(StreamTransport::new(
                self.config.hostname.clone(),
                self.config.port,
            )),
            TransportKind::Tftp => Box::new(BlockTransport::new(
                self.config.hostname.clone(),
                self.config.port,
            )),
        }
    }

    /// Encode the whole job without sending it. Used by tests and for
    /// dry runs; `send_job` streams the same blocks.
    pub fn encode_job(&self, job: &LaserJob) -> Result<Vec<u8>> {
        self.check_job(job)?;
        let encoder = JobEncoder::new(&self.encoder_config(), job.resolution());
        Ok(encoder.encode_job(job))
    }

    fn raster_seconds<'a>(
        &self,
        rows: impl Iterator<Item = &'a [u8]>,
        origin_x: i32,
        speed: u32,
        padding_mm: f64,
        dpi: f64,
    ) -> f64 {
        let head_speed = FULL_SPEED_MM_S * speed.max(1) as f64 / 100.0;
        let mut seconds = 0.0;
        for row in rows {
            let runs = extract_runs(row, origin_x);
            if let (Some(first), Some(last)) = (runs.first(), runs.last()) {
                let travel_px = (last.end - first.start + 1) as f64;
                let travel_mm = units::px_to_mm(travel_px, dpi) + 2.0 * padding_mm;
                seconds += travel_mm / head_speed;
            }
        }
        seconds
    }

    fn vector_seconds(&self, part: &VectorPart, dpi: f64) -> f64 {
        let dist_mm = |a: Point, b: Point| {
            let dx = (b.x - a.x) as f64;
            let dy = (b.y - a.y) as f64;
            units::px_to_mm((dx * dx + dy * dy).sqrt(), dpi)
        };
        let mut seconds = 0.0;
        let mut pos: Option<Point> = None;
        let mut speed = 50u32;
        for cmd in part.commands() {
            match *cmd {
                VectorCommand::MoveTo(p) => {
                    if let Some(prev) = pos {
                        seconds += dist_mm(prev, p) / FULL_SPEED_MM_S;
                    }
                    pos = Some(p);
                }
                VectorCommand::LineTo(p) => {
                    if let Some(prev) = pos {
                        seconds += dist_mm(prev, p)
                            / (FULL_SPEED_MM_S * speed.max(1) as f64 / 100.0);
                    }
                    pos = Some(p);
                }
                VectorCommand::SetSpeed(v) => speed = v,
                _ => {}
            }
        }
        seconds
    }
}

fn region_in_bed(
    part: &'static str,
    origin: Point,
    width: u32,
    height: u32,
    bed_w: i32,
    bed_h: i32,
) -> Result<()> {
    let max_x = origin.x + width as i32;
    let max_y = origin.y + height as i32;
    if origin.x < 0 || origin.y < 0 || max_x > bed_w || max_y > bed_h {
        return Err(JobError::OutOfBed {
            part,
            detail: format!(
                "region ({}, {}) {}x{} px outside {}x{} px bed",
                origin.x, origin.y, width, height, bed_w, bed_h
            ),
        }
        .into());
    }
    Ok(())
}

impl Device for LaosDevice {
    fn model_name(&self) -> &'static str {
        "LAOS"
    }

    fn bed_width(&self) -> f64 {
        self.config.bed_width
    }

    fn bed_height(&self) -> f64 {
        self.config.bed_height
    }

    fn resolutions(&self) -> Vec<u32> {
        vec![500]
    }

    fn estimate_duration(&self, job: &LaserJob) -> Duration {
        let dpi = job.resolution() as f64;
        let mut seconds = 0.0;
        if let Some(part) = job.raster3d() {
            seconds += self.raster_seconds(
                part.rows(),
                part.origin().x,
                part.property().speed,
                0.0,
                dpi,
            );
        }
        if let Some(part) = job.raster() {
            seconds += self.raster_seconds(
                part.rows(),
                part.origin().x,
                part.property().speed,
                self.config.raster_padding,
                dpi,
            );
        }
        if let Some(part) = job.vector() {
            seconds += self.vector_seconds(part, dpi);
        }
        Duration::from_secs_f64(seconds)
    }

    fn check_job(&self, job: &LaserJob) -> Result<()> {
        if !self.resolutions().contains(&job.resolution()) {
            return Err(JobError::UnsupportedResolution {
                dpi: job.resolution(),
            }
            .into());
        }
        if job.is_empty() {
            return Err(JobError::Empty.into());
        }
        let dpi = job.resolution() as f64;
        let bed_w = units::mm_to_px(self.config.bed_width, dpi) as i32;
        let bed_h = units::mm_to_px(self.config.bed_height, dpi) as i32;
        if let Some(part) = job.vector() {
            if let Some((min, max)) = part.bounds() {
                if min.x < 0 || min.y < 0 || max.x > bed_w || max.y > bed_h {
                    return Err(JobError::OutOfBed {
                        part: "vector",
                        detail: format!(
                            "extents ({}, {})..({}, {}) outside {}x{} px bed",
                            min.x, min.y, max.x, max.y, bed_w, bed_h
                        ),
                    }
                    .into());
                }
            }
        }
        if let Some(part) = job.raster() {
            region_in_bed(
                "raster",
                part.origin(),
                part.width(),
                part.height(),
                bed_w,
                bed_h,
            )?;
        }
        if let Some(part) = job.raster3d() {
            region_in_bed(
                "raster3d",
                part.origin(),
                part.width(),
                part.height(),
                bed_w,
                bed_h,
            )?;
        }
        Ok(())
    }

    fn send_job(&self, job: &LaserJob, progress: &mut dyn ProgressListener) -> Result<()> {
        progress.progress_changed(0);
        progress.task_changed("checking job");
        self.check_job(job)?;

        let mut transport = self.make_transport();
        match self.config.transport {
            TransportKind::Tcp => progress.task_changed("connecting"),
            TransportKind::Tftp => progress.task_changed("buffering"),
        }
        transport.begin()?;
        if self.config.transport == TransportKind::Tcp {
            progress.task_changed("sending");
        }

        let mut encoder = JobEncoder::new(&self.encoder_config(), job.resolution());
        transport.write_block(encoder.preamble().as_bytes())?;
        progress.progress_changed(20);
        if let Some(part) = job.raster3d() {
            transport.write_block(encoder.encode_raster3d(part).as_bytes())?;
        }
        progress.progress_changed(40);
        if let Some(part) = job.raster() {
            transport.write_block(encoder.encode_raster(part).as_bytes())?;
        }
        progress.progress_changed(60);
        if let Some(part) = job.vector() {
            transport.write_block(encoder.encode_vector(part).as_bytes())?;
        }
        progress.progress_changed(80);
        transport.write_block(encoder.trailer().as_bytes())?;

        if self.config.transport == TransportKind::Tftp {
            progress.task_changed("sending");
        }
        transport.finish(&job.remote_file_name())?;
        progress.task_changed("sent");
        progress.progress_changed(100);
        tracing::info!(
            "job '{}' sent to {} over {}",
            job.name(),
            self.config.hostname,
            self.config.transport
        );
        Ok(())
    }

    fn clone_device(&self) -> Box<dyn Device> {
        Box::new(self.clone())
    }

    fn setting_keys(&self) -> &'static [&'static str] {
        DeviceConfig::setting_keys()
    }

    fn setting(&self, key: &str) -> Option<String> {
        self.config.setting(key)
    }

    fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.config.set_setting(key, value)
    }
}
