//! The laser job model
//!
//! A [`LaserJob`] is the input to the whole pipeline: up to one vector
//! part, one 2-level raster part, and one multi-level (grayscale) raster
//! part, together with the job resolution and a display name. Jobs are
//! immutable for the duration of an encoding pass.
//!
//! All coordinates are device pixels at the job's resolution. Raster
//! intensities run 0..=255 where 0 is background (no burn) and 255 is
//! full commanded power.

use image::{DynamicImage, GrayImage};

/// A point in device pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Laser parameters applied to a whole raster region, or carried along a
/// vector command stream.
///
/// `power` and `speed` are percentages (0-100), `frequency` is in Hz and
/// `focus` is a focal offset in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserProperty {
    pub power: u32,
    pub speed: u32,
    pub frequency: u32,
    pub focus: f64,
}

impl Default for LaserProperty {
    fn default() -> Self {
        Self {
            power: 20,
            speed: 100,
            frequency: 5000,
            focus: 0.0,
        }
    }
}

/// One entry of a vector part's ordered command stream.
///
/// Later `Set*` commands apply to all subsequent `LineTo` commands until
/// overridden.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VectorCommand {
    /// Non-printing move to a point.
    MoveTo(Point),
    /// Laser-on move to a point.
    LineTo(Point),
    /// Set laser power (percent) for subsequent lines.
    SetPower(u32),
    /// Set movement speed (percent) for subsequent lines.
    SetSpeed(u32),
    /// Set pulse frequency (Hz) for subsequent lines.
    SetFrequency(u32),
    /// Set focal offset (mm) for subsequent lines.
    SetFocus(f64),
}

/// An ordered sequence of vector commands.
#[derive(Debug, Clone, Default)]
pub struct VectorPart {
    commands: Vec<VectorCommand>,
}

impl VectorPart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.commands.push(VectorCommand::MoveTo(Point::new(x, y)));
    }

    pub fn line_to(&mut self, x: i32, y: i32) {
        self.commands.push(VectorCommand::LineTo(Point::new(x, y)));
    }

    pub fn set_power(&mut self, power: u32) {
        self.commands.push(VectorCommand::SetPower(power));
    }

    pub fn set_speed(&mut self, speed: u32) {
        self.commands.push(VectorCommand::SetSpeed(speed));
    }

    pub fn set_frequency(&mut self, frequency: u32) {
        self.commands.push(VectorCommand::SetFrequency(frequency));
    }

    pub fn set_focus(&mut self, focus: f64) {
        self.commands.push(VectorCommand::SetFocus(focus));
    }

    pub fn commands(&self) -> &[VectorCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Bounding box over all `MoveTo`/`LineTo` coordinates, or `None`
    /// when the part contains no motion.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let mut bounds: Option<(Point, Point)> = None;
        for cmd in &self.commands {
            let p = match cmd {
                VectorCommand::MoveTo(p) | VectorCommand::LineTo(p) => *p,
                _ => continue,
            };
            bounds = Some(match bounds {
                None => (p, p),
                Some((min, max)) => (
                    Point::new(min.x.min(p.x), min.y.min(p.y)),
                    Point::new(max.x.max(p.x), max.y.max(p.y)),
                ),
            });
        }
        bounds
    }
}

/// A 2-level (on/off) raster region.
///
/// Pixels are exactly 0 (background) or 255 (burn). The associated
/// [`LaserProperty`] applies to the whole region.
#[derive(Debug, Clone)]
pub struct RasterPart {
    image: GrayImage,
    origin: Point,
    property: LaserProperty,
}

impl RasterPart {
    /// Wrap an already-rendered bitmap. Any non-zero pixel is
    /// normalized to 255.
    pub fn new(mut image: GrayImage, origin: Point, property: LaserProperty) -> Self {
        for px in image.pixels_mut() {
            if px.0[0] != 0 {
                px.0[0] = 255;
            }
        }
        Self {
            image,
            origin,
            property,
        }
    }

    /// Threshold an arbitrary image: source pixels with luminance below
    /// `threshold` burn.
    pub fn from_image(
        image: &DynamicImage,
        origin: Point,
        property: LaserProperty,
        threshold: u8,
    ) -> Self {
        let mut gray = image.to_luma8();
        for px in gray.pixels_mut() {
            px.0[0] = if px.0[0] < threshold { 255 } else { 0 };
        }
        Self {
            image: gray,
            origin,
            property,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn property(&self) -> &LaserProperty {
        &self.property
    }

    /// One scan line of intensities, top to bottom.
    pub fn scan_line(&self, y: u32) -> &[u8] {
        let w = self.image.width() as usize;
        let start = y as usize * w;
        &self.image.as_raw()[start..start + w]
    }

    /// All scan lines, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.image.as_raw().chunks_exact(self.image.width() as usize)
    }
}

/// A multi-level (grayscale) raster region with intensities 0..=255.
///
/// Commanded power for a pixel is the region power scaled by
/// `intensity / 255`.
#[derive(Debug, Clone)]
pub struct Raster3dPart {
    image: GrayImage,
    origin: Point,
    property: LaserProperty,
}

impl Raster3dPart {
    /// Wrap a bitmap whose pixels already are burn intensities.
    pub fn new(image: GrayImage, origin: Point, property: LaserProperty) -> Self {
        Self {
            image,
            origin,
            property,
        }
    }

    /// Convert an arbitrary image: darker source pixels burn harder
    /// (intensity = 255 - luminance).
    pub fn from_image(image: &DynamicImage, origin: Point, property: LaserProperty) -> Self {
        let mut gray = image.to_luma8();
        for px in gray.pixels_mut() {
            px.0[0] = 255 - px.0[0];
        }
        Self {
            image: gray,
            origin,
            property,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn property(&self) -> &LaserProperty {
        &self.property
    }

    /// One scan line of intensities, top to bottom.
    pub fn scan_line(&self, y: u32) -> &[u8] {
        let w = self.image.width() as usize;
        let start = y as usize * w;
        &self.image.as_raw()[start..start + w]
    }

    /// All scan lines, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.image.as_raw().chunks_exact(self.image.width() as usize)
    }
}

/// A complete laser job: the unit of one encode-and-send invocation.
#[derive(Debug, Clone)]
pub struct LaserJob {
    name: String,
    resolution: u32,
    vector: Option<VectorPart>,
    raster: Option<RasterPart>,
    raster3d: Option<Raster3dPart>,
}

impl LaserJob {
    /// Create an empty job at `resolution` dots per inch.
    pub fn new(name: impl Into<String>, resolution: u32) -> Self {
        Self {
            name: name.into(),
            resolution,
            vector: None,
            raster: None,
            raster3d: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn set_vector(&mut self, part: VectorPart) {
        self.vector = Some(part);
    }

    pub fn set_raster(&mut self, part: RasterPart) {
        self.raster = Some(part);
    }

    pub fn set_raster3d(&mut self, part: Raster3dPart) {
        self.raster3d = Some(part);
    }

    pub fn vector(&self) -> Option<&VectorPart> {
        self.vector.as_ref()
    }

    pub fn raster(&self) -> Option<&RasterPart> {
        self.raster.as_ref()
    }

    pub fn raster3d(&self) -> Option<&Raster3dPart> {
        self.raster3d.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.vector.as_ref().map_or(true, |v| v.is_empty())
            && self.raster.is_none()
            && self.raster3d.is_none()
    }

    /// The file name used on the remote side by the block-transfer
    /// strategy: the display name with all whitespace stripped, plus the
    /// fixed `.lgc` extension.
    pub fn remote_file_name(&self) -> String {
        let mut name: String = self.name.chars().filter(|c| !c.is_whitespace()).collect();
        name.push_str(".lgc");
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_file_name_strips_whitespace() {
        let job = LaserJob::new("My Test Job", 500);
        assert_eq!(job.remote_file_name(), "MyTestJob.lgc");

        let job = LaserJob::new("plain", 500);
        assert_eq!(job.remote_file_name(), "plain.lgc");
    }

    #[test]
    fn test_raster_part_normalizes_levels() {
        let img = GrayImage::from_raw(3, 1, vec![0, 7, 255]).unwrap();
        let part = RasterPart::new(img, Point::new(0, 0), LaserProperty::default());
        assert_eq!(part.scan_line(0), &[0, 255, 255]);
    }

    #[test]
    fn test_raster3d_scan_lines() {
        let img = GrayImage::from_raw(2, 2, vec![1, 2, 3, 4]).unwrap();
        let part = Raster3dPart::new(img, Point::new(0, 0), LaserProperty::default());
        assert_eq!(part.scan_line(0), &[1, 2]);
        assert_eq!(part.scan_line(1), &[3, 4]);
        let rows: Vec<&[u8]> = part.rows().collect();
        assert_eq!(rows, vec![&[1u8, 2][..], &[3u8, 4][..]]);
    }

    #[test]
    fn test_vector_bounds() {
        let mut part = VectorPart::new();
        assert!(part.bounds().is_none());
        part.set_power(50);
        assert!(part.bounds().is_none());
        part.move_to(10, 20);
        part.line_to(-5, 40);
        let (min, max) = part.bounds().unwrap();
        assert_eq!(min, Point::new(-5, 20));
        assert_eq!(max, Point::new(10, 40));
    }

    #[test]
    fn test_empty_job() {
        let mut job = LaserJob::new("j", 500);
        assert!(job.is_empty());
        let mut v = VectorPart::new();
        v.move_to(0, 0);
        job.set_vector(v);
        assert!(!job.is_empty());
    }
}
