//! The job encoder
//!
//! A [`JobEncoder`] renders one job into the instruction stream, block
//! by block: preamble, multi-level raster, 2-level raster, vector,
//! trailer. The blocks are separate so the driver can report progress
//! between them; [`JobEncoder::encode_job`] concatenates them for
//! callers that want the whole stream at once.
//!
//! An encoder instance is scoped to a single encoding pass. It owns the
//! pass state, which starts unset and must not leak into another job;
//! construct a fresh encoder per send.

use laserkit_core::{LaserJob, LaserProperty, Point, Raster3dPart, RasterPart, VectorPart};
use laserkit_core::job::VectorCommand;

use crate::dialect::{Dialect, InstructionFormat};
use crate::raster::{extract_runs, scaled_power};
use crate::state::PassState;
use crate::transform::Transform;

/// The slice of the device configuration the encoder needs.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub dialect: Dialect,
    /// Laser bed width in millimeters; the flip pivot and clamp limit.
    pub bed_width: f64,
    /// Mirror the X axis (`bed_width_px - x`).
    pub flip_x: bool,
    /// Physical length of one motor step, used by the simple dialect.
    pub mm_per_step: f64,
    /// Acceleration space added before and after each 2-level raster
    /// line, in millimeters.
    pub raster_padding: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Simple,
            bed_width: 250.0,
            flip_x: false,
            mm_per_step: 0.001,
            raster_padding: 5.0,
        }
    }
}

/// Renders one [`LaserJob`] into dialect instructions.
pub struct JobEncoder {
    format: Box<dyn InstructionFormat>,
    state: PassState,
    transform: Transform,
    padding_px: i32,
}

impl JobEncoder {
    /// A fresh encoder for one pass over a job at `resolution` dpi.
    pub fn new(config: &EncoderConfig, resolution: u32) -> Self {
        let transform = Transform::new(
            resolution,
            config.flip_x,
            config.bed_width,
            config.mm_per_step,
        );
        Self {
            format: config.dialect.format(transform),
            state: PassState::new(),
            transform,
            padding_px: transform.mm_to_px(config.raster_padding),
        }
    }

    /// The dialect's one-time startup block.
    pub fn preamble(&self) -> String {
        let mut out = String::new();
        self.format.preamble(&mut out);
        out
    }

    /// The dialect's one-time shutdown block.
    pub fn trailer(&self) -> String {
        let mut out = String::new();
        self.format.trailer(&mut out);
        out
    }

    /// Render a vector part. Set-commands update the pending laser
    /// parameters, which ride along on every subsequent laser-on move.
    pub fn encode_vector(&mut self, part: &VectorPart) -> String {
        let mut out = String::new();
        let mut power = 100u32;
        let mut speed = 50u32;
        let mut frequency = 500u32;
        for cmd in part.commands() {
            match *cmd {
                VectorCommand::MoveTo(p) => self.format.rapid_move(&mut out, p),
                VectorCommand::LineTo(p) => self.format.burn_move(
                    &mut out,
                    p,
                    power,
                    speed,
                    frequency,
                    &mut self.state,
                ),
                VectorCommand::SetPower(v) => power = v,
                VectorCommand::SetSpeed(v) => speed = v,
                VectorCommand::SetFrequency(v) => frequency = v,
                VectorCommand::SetFocus(f) => self.format.set_focus(&mut out, f),
            }
        }
        out
    }

    /// Render a 2-level raster region, with acceleration padding around
    /// every line.
    pub fn encode_raster(&mut self, part: &RasterPart) -> String {
        let mut out = String::new();
        self.scan_region(
            &mut out,
            part.origin(),
            part.rows(),
            part.property(),
            true,
        );
        out
    }

    /// Render a multi-level raster region. No padding: grayscale lines
    /// modulate power mid-flight instead of sprinting through a span.
    pub fn encode_raster3d(&mut self, part: &Raster3dPart) -> String {
        let mut out = String::new();
        self.scan_region(
            &mut out,
            part.origin(),
            part.rows(),
            part.property(),
            false,
        );
        out
    }

    /// Render the whole job in device order: preamble, multi-level
    /// raster, 2-level raster, vector, trailer.
    pub fn encode_job(mut self, job: &LaserJob) -> Vec<u8> {
        let mut stream = String::new();
        stream.push_str(&self.preamble());
        if let Some(part) = job.raster3d() {
            stream.push_str(&self.encode_raster3d(part));
        }
        if let Some(part) = job.raster() {
            stream.push_str(&self.encode_raster(part));
        }
        if let Some(part) = job.vector() {
            stream.push_str(&self.encode_vector(part));
        }
        stream.push_str(&self.trailer());
        stream.into_bytes()
    }

    /// Serpentine scan over one region, top to bottom, starting left to
    /// right. Direction alternates on every line whether or not the line
    /// produced output.
    fn scan_region<'a>(
        &mut self,
        out: &mut String,
        origin: Point,
        rows: impl Iterator<Item = &'a [u8]>,
        property: &LaserProperty,
        use_padding: bool,
    ) {
        self.format.set_focus(out, property.focus);
        let bed_px = self.transform.bed_width_px();
        let mut left_to_right = true;
        for (i, row) in rows.enumerate() {
            let y = origin.y + i as i32;
            let runs = extract_runs(row, origin.x);
            if let (Some(first), Some(last)) = (runs.first(), runs.last()) {
                if left_to_right {
                    if use_padding {
                        let lead_in = (first.start - self.padding_px).max(0);
                        self.format.rapid_move(out, Point::new(lead_in, y));
                    }
                    self.format.rapid_move(out, Point::new(first.start, y));
                    for (k, run) in runs.iter().enumerate() {
                        self.format.burn_move(
                            out,
                            Point::new(run.end, y),
                            scaled_power(property.power, run.intensity),
                            property.speed,
                            property.frequency,
                            &mut self.state,
                        );
                        if let Some(next) = runs.get(k + 1) {
                            self.format.rapid_move(out, Point::new(next.start, y));
                        }
                    }
                    if use_padding {
                        let lead_out = (last.end + self.padding_px).min(bed_px);
                        self.format.rapid_move(out, Point::new(lead_out, y));
                    }
                } else {
                    if use_padding {
                        let lead_in = (last.end + self.padding_px).min(bed_px);
                        self.format.rapid_move(out, Point::new(lead_in, y));
                    }
                    self.format.rapid_move(out, Point::new(last.end, y));
                    for (k, run) in runs.iter().enumerate().rev() {
                        self.format.burn_move(
                            out,
                            Point::new(run.start, y),
                            scaled_power(property.power, run.intensity),
                            property.speed,
                            property.frequency,
                            &mut self.state,
                        );
                        if k > 0 {
                            self.format.rapid_move(out, Point::new(runs[k - 1].end, y));
                        }
                    }
                    if use_padding {
                        let lead_out = (first.start - self.padding_px).max(0);
                        self.format.rapid_move(out, Point::new(lead_out, y));
                    }
                }
            }
            // direction bookkeeping advances even for all-background lines
            left_to_right = !left_to_right;
        }
    }
}
