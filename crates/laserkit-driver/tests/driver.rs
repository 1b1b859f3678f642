//! Driver-level tests: job checking, config persistence, and the full
//! encode-then-send path against loopback servers.

use image::GrayImage;
use laserkit_core::{
    Error, JobError, LaserJob, LaserProperty, Point, ProgressListener, Raster3dPart, RasterPart,
    VectorPart,
};
use laserkit_driver::{Device, DeviceConfig, LaosDevice, SETTING_GCODE, SETTING_PORT};
use std::io::Read;
use std::net::{TcpListener, UdpSocket};
use std::thread;

/// Records every progress event for later inspection.
#[derive(Default)]
struct Recorder {
    percents: Vec<u8>,
    tasks: Vec<String>,
}

impl ProgressListener for Recorder {
    fn progress_changed(&mut self, percent: u8) {
        self.percents.push(percent);
    }

    fn task_changed(&mut self, task: &str) {
        self.tasks.push(task.to_string());
    }
}

fn vector_job(name: &str) -> LaserJob {
    let mut part = VectorPart::new();
    part.set_power(50);
    part.set_speed(80);
    part.move_to(100, 100);
    part.line_to(600, 100);
    part.line_to(600, 600);

    let mut job = LaserJob::new(name, 500);
    job.set_vector(part);
    job
}

fn full_job(name: &str) -> LaserJob {
    let mut job = vector_job(name);
    job.set_raster(RasterPart::new(
        GrayImage::from_raw(3, 2, vec![255, 255, 0, 0, 255, 255]).unwrap(),
        Point::new(10, 10),
        LaserProperty::default(),
    ));
    job.set_raster3d(Raster3dPart::new(
        GrayImage::from_raw(2, 2, vec![0, 128, 200, 0]).unwrap(),
        Point::new(40, 40),
        LaserProperty::default(),
    ));
    job
}

#[test]
fn check_job_rejects_unsupported_resolution() {
    let device = LaosDevice::new();
    let job = LaserJob::new("job", 300);
    let err = device.check_job(&job).unwrap_err();
    assert!(matches!(
        err,
        Error::Job(JobError::UnsupportedResolution { dpi: 300 })
    ));
}

#[test]
fn check_job_rejects_empty_job() {
    let device = LaosDevice::new();
    let job = LaserJob::new("nothing", 500);
    assert!(matches!(
        device.check_job(&job).unwrap_err(),
        Error::Job(JobError::Empty)
    ));
}

#[test]
fn check_job_rejects_vector_outside_bed() {
    let device = LaosDevice::new();
    let mut part = VectorPart::new();
    part.move_to(0, 0);
    // the default 250 mm bed is 4921 px wide at 500 dpi
    part.line_to(5000, 0);
    let mut job = LaserJob::new("wide", 500);
    job.set_vector(part);
    assert!(matches!(
        device.check_job(&job).unwrap_err(),
        Error::Job(JobError::OutOfBed { part: "vector", .. })
    ));
}

#[test]
fn check_job_rejects_raster_outside_bed() {
    let device = LaosDevice::new();
    let mut job = LaserJob::new("low", 500);
    job.set_raster(RasterPart::new(
        GrayImage::from_raw(1, 1, vec![255]).unwrap(),
        Point::new(0, -1),
        LaserProperty::default(),
    ));
    assert!(matches!(
        device.check_job(&job).unwrap_err(),
        Error::Job(JobError::OutOfBed { part: "raster", .. })
    ));
}

#[test]
fn check_job_accepts_well_formed_job() {
    let device = LaosDevice::new();
    assert!(device.check_job(&full_job("ok")).is_ok());
}

#[test]
fn encode_job_rejects_invalid_job_before_encoding() {
    let device = LaosDevice::new();
    let job = LaserJob::new("job", 300);
    assert!(device.encode_job(&job).is_err());
}

#[test]
fn send_job_over_stream_delivers_encoded_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).unwrap();
        received
    });

    let mut device = LaosDevice::new();
    device.config_mut().hostname = "127.0.0.1".to_string();
    device.config_mut().port = port;
    device.set_setting("Use TFTP instead of TCP (yes/no)", "no").unwrap();

    let job = full_job("stream job");
    let expected = device.encode_job(&job).unwrap();

    let mut progress = Recorder::default();
    device.send_job(&job, &mut progress).unwrap();

    assert_eq!(server.join().unwrap(), expected);
    assert_eq!(progress.percents, vec![0, 20, 40, 60, 80, 100]);
    assert_eq!(
        progress.tasks,
        vec!["checking job", "connecting", "sending", "sent"]
    );
}

#[test]
fn send_job_over_tftp_uses_job_name() {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = server.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let mut buf = [0u8; 2048];
        let (n, client) = server.recv_from(&mut buf).unwrap();
        assert_eq!(u16::from_be_bytes([buf[0], buf[1]]), 2);
        let name = String::from_utf8(
            buf[2..n].split(|&b| b == 0).next().unwrap().to_vec(),
        )
        .unwrap();

        let transfer = UdpSocket::bind("127.0.0.1:0").unwrap();
        transfer.send_to(&[0, 4, 0, 0], client).unwrap();
        let mut payload = Vec::new();
        loop {
            let (n, from) = transfer.recv_from(&mut buf).unwrap();
            payload.extend_from_slice(&buf[4..n]);
            transfer.send_to(&[0, 4, buf[2], buf[3]], from).unwrap();
            if n - 4 < 512 {
                break;
            }
        }
        (name, payload)
    });

    let mut device = LaosDevice::new();
    device.config_mut().hostname = "127.0.0.1".to_string();
    device.config_mut().port = port;

    let job = vector_job("My Tftp Job");
    let expected = device.encode_job(&job).unwrap();

    let mut progress = Recorder::default();
    device.send_job(&job, &mut progress).unwrap();

    let (name, payload) = handle.join().unwrap();
    assert_eq!(name, "MyTftpJob.lgc");
    assert_eq!(payload, expected);
    assert_eq!(
        progress.tasks,
        vec!["checking job", "buffering", "sending", "sent"]
    );
    // milestones never move backwards
    assert!(progress.percents.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn send_job_failure_aborts_with_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut device = LaosDevice::new();
    device.config_mut().hostname = "127.0.0.1".to_string();
    device.config_mut().port = port;
    device.set_setting("Use TFTP instead of TCP (yes/no)", "no").unwrap();

    let mut progress = Recorder::default();
    let err = device.send_job(&vector_job("doomed"), &mut progress).unwrap_err();
    assert!(err.is_transport_error());
    // the send never got past the connection phase
    assert!(!progress.percents.contains(&100));
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();

    let mut config = DeviceConfig::default();
    config.hostname = "10.0.0.42".to_string();
    config.set_setting(SETTING_GCODE, "yes").unwrap();
    config.set_setting(SETTING_PORT, "8080").unwrap();

    for file in ["device.json", "device.toml"] {
        let path = dir.path().join(file);
        config.save_to_file(&path).unwrap();
        let loaded = DeviceConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config, "{}", file);
    }

    let bad = dir.path().join("device.ini");
    assert!(config.save_to_file(&bad).is_err());
}

#[test]
fn estimate_grows_with_job_size() {
    let device = LaosDevice::new();

    let small = {
        let mut job = LaserJob::new("small", 500);
        job.set_raster(RasterPart::new(
            GrayImage::from_raw(100, 1, vec![255; 100]).unwrap(),
            Point::new(0, 0),
            LaserProperty::default(),
        ));
        job
    };
    let large = {
        let mut job = LaserJob::new("large", 500);
        job.set_raster(RasterPart::new(
            GrayImage::from_raw(100, 40, vec![255; 4000]).unwrap(),
            Point::new(0, 0),
            LaserProperty::default(),
        ));
        job
    };

    let small_est = device.estimate_duration(&small);
    let large_est = device.estimate_duration(&large);
    assert!(small_est.as_secs_f64() > 0.0);
    assert!(large_est > small_est);
}

#[test]
fn cloned_device_is_independent() {
    let mut device = LaosDevice::new();
    device.set_setting(SETTING_PORT, "1234").unwrap();

    let clone = device.clone_device();
    assert_eq!(clone.setting(SETTING_PORT).unwrap(), "1234");

    device.set_setting(SETTING_PORT, "5678").unwrap();
    assert_eq!(clone.setting(SETTING_PORT).unwrap(), "1234");
}
