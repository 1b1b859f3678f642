//! Instruction dialects
//!
//! The controller board understands two incompatible encodings: the
//! simple code (opcode-prefixed numeric lines addressing the motors in
//! steps) and a G-code subset (physical millimeters). Both implement the
//! same narrow [`InstructionFormat`] contract so the encoder never
//! branches on the dialect itself.
//!
//! All output is ASCII with newline-terminated lines. Decimal formatting
//! uses Rust's locale-independent `format!`, so emitted files are
//! portable.

use laserkit_core::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::state::PassState;
use crate::transform::Transform;

/// Which instruction encoding to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Opcode-prefixed numeric lines, coordinates in motor steps.
    Simple,
    /// G-code subset, coordinates in millimeters.
    Gcode,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::Simple
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Gcode => write!(f, "gcode"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "gcode" | "g-code" => Ok(Self::Gcode),
            _ => Err(format!("Unknown dialect: {}", s)),
        }
    }
}

impl Dialect {
    /// Build the instruction renderer for this dialect.
    pub fn format(self, transform: Transform) -> Box<dyn InstructionFormat> {
        match self {
            Self::Simple => Box::new(SimpleFormat::new(transform)),
            Self::Gcode => Box::new(GcodeFormat::new(transform)),
        }
    }
}

/// Renders single instructions into literal dialect text.
///
/// Implementations own the coordinate transform, including the
/// horizontal axis inversion. Laser parameters travel with every
/// [`burn_move`](Self::burn_move); dialects that write them as separate
/// instructions consult the pass state to suppress redundant ones.
pub trait InstructionFormat {
    /// One-time startup block, written before any job content.
    fn preamble(&self, out: &mut String);

    /// Non-printing move.
    fn rapid_move(&self, out: &mut String, p: Point);

    /// Laser-on move with the given parameters.
    fn burn_move(
        &self,
        out: &mut String,
        p: Point,
        power: u32,
        speed: u32,
        frequency: u32,
        state: &mut PassState,
    );

    /// Set the focal offset (millimeters).
    fn set_focus(&self, out: &mut String, focus: f64);

    /// One-time shutdown block, written after all job content.
    fn trailer(&self, out: &mut String);
}

/// The simple code: `0 x y` move, `1 x y` laser-on move, `2 f` focus
/// (all in motor steps), `7 101 p` power x100, `7 100 s` speed x100,
/// `7 102 q` frequency.
pub struct SimpleFormat {
    transform: Transform,
}

impl SimpleFormat {
    pub fn new(transform: Transform) -> Self {
        Self { transform }
    }
}

impl InstructionFormat for SimpleFormat {
    fn preamble(&self, _out: &mut String) {}

    fn rapid_move(&self, out: &mut String, p: Point) {
        let t = &self.transform;
        out.push_str(&format!(
            "0 {} {}\n",
            t.px_to_steps(t.apply_flip(p.x)),
            t.px_to_steps(p.y)
        ));
    }

    fn burn_move(
        &self,
        out: &mut String,
        p: Point,
        power: u32,
        speed: u32,
        frequency: u32,
        state: &mut PassState,
    ) {
        if state.update_power(power) {
            out.push_str(&format!("7 101 {}\n", power * 100));
        }
        if state.update_speed(speed) {
            out.push_str(&format!("7 100 {}\n", speed * 100));
        }
        if state.update_frequency(frequency) {
            out.push_str(&format!("7 102 {}\n", frequency));
        }
        let t = &self.transform;
        out.push_str(&format!(
            "1 {} {}\n",
            t.px_to_steps(t.apply_flip(p.x)),
            t.px_to_steps(p.y)
        ));
    }

    fn set_focus(&self, out: &mut String, focus: f64) {
        out.push_str(&format!("2 {}\n", self.transform.mm_to_steps(focus)));
    }

    fn trailer(&self, out: &mut String) {
        // park the focus at zero on the way out
        self.set_focus(out, 0.0);
    }
}

/// The G-code subset: `G0 X.. Y..` rapids and `G1 X.. Y.. E.. F..`
/// laser-on moves carrying power and speed inline, plus a fixed
/// preamble (home, metric units, ventilation and air assist on) and
/// shutdown trailer.
///
/// Frequency and focus have no mapping in this dialect: `burn_move`
/// ignores the frequency and [`set_focus`](InstructionFormat::set_focus)
/// is a no-op. Neither consults the pass state.
pub struct GcodeFormat {
    transform: Transform,
}

impl GcodeFormat {
    pub fn new(transform: Transform) -> Self {
        Self { transform }
    }
}

impl InstructionFormat for GcodeFormat {
    fn preamble(&self, out: &mut String) {
        out.push_str("G28\n"); // move to origin
        out.push_str("G21\n"); // units to mm
        out.push_str("M106\n"); // ventilation on
        out.push_str("M151 100\n"); // air assist on
    }

    fn rapid_move(&self, out: &mut String, p: Point) {
        let t = &self.transform;
        out.push_str(&format!(
            "G0 X{:.3} Y{:.3}\n",
            t.px_to_mm(t.apply_flip(p.x)),
            t.px_to_mm(p.y)
        ));
    }

    fn burn_move(
        &self,
        out: &mut String,
        p: Point,
        power: u32,
        speed: u32,
        _frequency: u32,
        _state: &mut PassState,
    ) {
        let t = &self.transform;
        out.push_str(&format!(
            "G1 X{:.3} Y{:.3} E{} F{}\n",
            t.px_to_mm(t.apply_flip(p.x)),
            t.px_to_mm(p.y),
            power,
            speed
        ));
    }

    fn set_focus(&self, _out: &mut String, _focus: f64) {
        // unsupported in this dialect
    }

    fn trailer(&self, out: &mut String) {
        out.push_str("G0 X0.000 Y0.000\n");
        out.push_str("G28\n");
        out.push_str("M107\n"); // ventilation off
        out.push_str("M151 0\n"); // air assist off
        out.push_str("M0\n"); // halt
    }
}
