use anyhow::Context;
use clap::Parser;
use laserkit::{
    Device, DeviceConfig, LaosDevice, LaserJob, LaserProperty, Point, ProgressListener,
    Raster3dPart, RasterPart,
};
use std::path::PathBuf;

/// Send an image engraving job to a networked laser cutter.
#[derive(Parser, Debug)]
#[command(name = "laserkit", version, about)]
struct Args {
    /// Device configuration file (.json or .toml); board defaults apply
    /// when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image to engrave
    #[arg(long)]
    image: PathBuf,

    /// Engrave with 256 intensity levels instead of on/off
    #[arg(long)]
    grayscale: bool,

    /// Laser power in percent
    #[arg(long, default_value_t = 80)]
    power: u32,

    /// Movement speed in percent
    #[arg(long, default_value_t = 100)]
    speed: u32,

    /// Pulse frequency in Hz
    #[arg(long, default_value_t = 5000)]
    frequency: u32,

    /// Focal offset in mm
    #[arg(long, default_value_t = 0.0)]
    focus: f64,

    /// Job resolution in dpi
    #[arg(long, default_value_t = 500)]
    dpi: u32,

    /// Black/white threshold for on/off engraving (0-255)
    #[arg(long, default_value_t = 128)]
    threshold: u8,

    /// X origin on the bed, in device pixels
    #[arg(long, default_value_t = 0)]
    x: i32,

    /// Y origin on the bed, in device pixels
    #[arg(long, default_value_t = 0)]
    y: i32,

    /// Job name; the remote file name derives from it
    #[arg(long)]
    name: Option<String>,

    /// Write the encoded stream to a file instead of sending it
    #[arg(long)]
    out: Option<PathBuf>,
}

struct ConsoleProgress;

impl ProgressListener for ConsoleProgress {
    fn progress_changed(&mut self, percent: u8) {
        println!("[{:3}%]", percent);
    }

    fn task_changed(&mut self, task: &str) {
        println!("  -> {}", task);
    }
}

fn main() -> anyhow::Result<()> {
    laserkit::init_logging()?;
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DeviceConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DeviceConfig::default(),
    };

    let image = image::open(&args.image)
        .with_context(|| format!("loading image {}", args.image.display()))?;
    let name = args.name.clone().unwrap_or_else(|| {
        args.image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "job".to_string())
    });

    let property = LaserProperty {
        power: args.power,
        speed: args.speed,
        frequency: args.frequency,
        focus: args.focus,
    };
    let origin = Point::new(args.x, args.y);

    let mut job = LaserJob::new(name, args.dpi);
    if args.grayscale {
        job.set_raster3d(Raster3dPart::from_image(&image, origin, property));
    } else {
        job.set_raster(RasterPart::from_image(
            &image,
            origin,
            property,
            args.threshold,
        ));
    }

    let device = LaosDevice::with_config(config);
    match &args.out {
        Some(path) => {
            let stream = device.encode_job(&job)?;
            std::fs::write(path, &stream)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {} bytes to {}", stream.len(), path.display());
        }
        None => {
            println!(
                "estimated duration: {:.0?}",
                device.estimate_duration(&job)
            );
            device.send_job(&job, &mut ConsoleProgress)?;
        }
    }

    Ok(())
}
