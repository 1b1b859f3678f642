//! Coordinate transforms for one encoding pass
//!
//! Owns the conversions between the three coordinate spaces the encoder
//! touches: device pixels at the job resolution, physical millimeters
//! (G-code dialect), and motor steps (simple dialect). Also applies the
//! horizontal axis inversion for beds whose X axis runs right to left.

use laserkit_core::units;

/// Immutable conversion context built from the device configuration and
/// the job's resolution.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    dpi: f64,
    flip_x: bool,
    bed_width: f64,
    mm_per_step: f64,
}

impl Transform {
    /// `bed_width` is in millimeters, `mm_per_step` is the physical
    /// length of one motor step (simple dialect only).
    pub fn new(resolution: u32, flip_x: bool, bed_width: f64, mm_per_step: f64) -> Self {
        Self {
            dpi: resolution as f64,
            flip_x,
            bed_width,
            mm_per_step,
        }
    }

    /// The bed width expressed in device pixels at this resolution.
    pub fn bed_width_px(&self) -> i32 {
        units::mm_to_px(self.bed_width, self.dpi) as i32
    }

    /// Apply the horizontal axis inversion: `bed_width_px - x` when the
    /// flip is configured, identity otherwise.
    pub fn apply_flip(&self, x: i32) -> i32 {
        if self.flip_x {
            self.bed_width_px() - x
        } else {
            x
        }
    }

    /// Device pixels to millimeters.
    pub fn px_to_mm(&self, px: i32) -> f64 {
        units::px_to_mm(px as f64, self.dpi)
    }

    /// Millimeters to device pixels (truncating).
    pub fn mm_to_px(&self, mm: f64) -> i32 {
        units::mm_to_px(mm, self.dpi) as i32
    }

    /// Device pixels to motor steps (truncating).
    pub fn px_to_steps(&self, px: i32) -> i64 {
        (self.px_to_mm(px) / self.mm_per_step) as i64
    }

    /// Millimeters to motor steps (truncating).
    pub fn mm_to_steps(&self, mm: f64) -> i64 {
        (mm / self.mm_per_step) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_disabled_is_identity() {
        let t = Transform::new(500, false, 250.0, 0.001);
        assert_eq!(t.apply_flip(0), 0);
        assert_eq!(t.apply_flip(1234), 1234);
    }

    #[test]
    fn test_flip_mirrors_around_bed_width() {
        let t = Transform::new(500, true, 250.0, 0.001);
        let bed = t.bed_width_px();
        assert_eq!(t.apply_flip(0), bed);
        assert_eq!(t.apply_flip(bed), 0);
        assert_eq!(t.apply_flip(100), bed - 100);
    }

    #[test]
    fn test_flip_roundtrip() {
        let t = Transform::new(500, true, 250.0, 0.001);
        for x in [0, 1, 100, 4000] {
            assert_eq!(t.apply_flip(t.apply_flip(x)), x);
        }
    }

    #[test]
    fn test_px_to_steps() {
        // 0.0508 mm per step makes one step exactly one pixel at 500 dpi
        let t = Transform::new(500, false, 250.0, 25.4 / 500.0);
        assert_eq!(t.px_to_steps(0), 0);
        assert_eq!(t.px_to_steps(10), 10);

        let t = Transform::new(500, false, 250.0, 0.001);
        // one pixel at 500 dpi is 0.0508 mm = 50.8 steps, truncated
        assert_eq!(t.px_to_steps(1), 50);
    }

    #[test]
    fn test_mm_to_steps() {
        let t = Transform::new(500, false, 250.0, 0.001);
        assert_eq!(t.mm_to_steps(1.0), 1000);
        assert_eq!(t.mm_to_steps(0.0), 0);
    }

    #[test]
    fn test_px_to_mm() {
        let t = Transform::new(500, false, 250.0, 0.001);
        assert!((t.px_to_mm(500) - 25.4).abs() < 1e-9);
    }
}
