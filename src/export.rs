//! CSV export of the archive.
//!
//! Missing scalar fields are written as `0`. Missing vectors leave their three
//! cells empty, so a real zero reading and an absent sensor stay
//! distinguishable for the vector columns.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use nalgebra::Vector3;

use crate::error::{Error, Result};
use crate::sample::Sample;

pub const HEADER: [&str; 16] = [
    "timestamp",
    "temperature",
    "pressure",
    "fps",
    "acc_x",
    "acc_y",
    "acc_z",
    "gyr_x",
    "gyr_y",
    "gyr_z",
    "mag_x",
    "mag_y",
    "mag_z",
    "roll",
    "pitch",
    "yaw",
];

const MISSING_SCALAR: &str = "0";

/// `imu_data_<YYYYmmdd_HHMMSS>.csv` in local time.
pub fn default_file_name() -> String {
    format!("imu_data_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

/// Writes the header and one row per sample. Returns the number of rows.
pub fn write_csv<'a, W, I>(writer: W, samples: I) -> Result<usize>
where
    W: io::Write,
    I: IntoIterator<Item = &'a Sample>,
{
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(HEADER)?;
    let mut rows = 0;
    for sample in samples {
        writer.write_record(record(sample))?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

/// Creates (or truncates) `path` and writes `samples` to it. Any failure comes
/// back as [`Error::Export`].
pub fn export_csv<'a, I>(path: &Path, samples: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Sample>,
{
    let write = || -> Result<usize> {
        let file = File::create(path)?;
        write_csv(BufWriter::new(file), samples)
    };

    let rows = write().map_err(|source| {
        log::error!("export to '{}' failed: {source}", path.display());
        Error::Export {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    })?;

    log::info!("exported {rows} samples to '{}'", path.display());
    Ok(rows)
}

fn record(sample: &Sample) -> Vec<String> {
    let mut row = Vec::with_capacity(HEADER.len());
    row.push(scalar(sample.timestamp));
    row.push(scalar(sample.temperature));
    row.push(scalar(sample.pressure));
    row.push(scalar(sample.fps));
    for v in [sample.accel, sample.gyro, sample.mag, sample.euler] {
        row.extend(components(v));
    }
    row
}

fn scalar<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING_SCALAR.to_string(), |v| v.to_string())
}

fn components(value: Option<Vector3<f64>>) -> [String; 3] {
    match value {
        Some(v) => [v.x.to_string(), v.y.to_string(), v.z.to_string()],
        None => Default::default(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::vector;

    fn to_string(samples: &[Sample]) -> String {
        let mut out = vec![];
        write_csv(&mut out, samples).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn header_only_for_empty_archive() {
        assert_eq!(
            to_string(&[]).lines().collect::<Vec<_>>(),
            vec![
                "timestamp,temperature,pressure,fps,acc_x,acc_y,acc_z,gyr_x,gyr_y,gyr_z,\
                 mag_x,mag_y,mag_z,roll,pitch,yaw"
            ]
        );
    }

    #[test]
    fn sentinels() {
        let full = Sample {
            timestamp: Some(123456),
            temperature: Some(25),
            euler: Some(vector![10.5, -20.25, 180.0]),
            accel: Some(vector![0.01, -0.02, 0.98]),
            gyro: Some(vector![1.5, 2.5, -3.5]),
            mag: Some(vector![30.1, -12.4, 45.0]),
            pressure: Some(1013.25),
            fps: Some(998.7),
        };
        let accel_only = Sample {
            accel: Some(vector![1.0, 2.0, 3.0]),
            ..Default::default()
        };
        let temperature_only = Sample {
            temperature: Some(-5),
            ..Default::default()
        };

        let csv = to_string(&[full, accel_only, temperature_only]);
        let rows: Vec<_> = csv.lines().skip(1).collect();
        assert_eq!(
            rows,
            vec![
                "123456,25,1013.25,998.7,0.01,-0.02,0.98,1.5,2.5,-3.5,30.1,-12.4,45,10.5,-20.25,180",
                "0,0,0,0,1,2,3,,,,,,,,,",
                "0,-5,0,0,,,,,,,,,,,,",
            ]
        );
    }

    #[test]
    fn rows_keep_archive_order() {
        let samples: Vec<_> = (0..5)
            .map(|t| Sample {
                timestamp: Some(t),
                ..Default::default()
            })
            .collect();
        let csv = to_string(&samples);
        let first_column: Vec<_> = csv
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(first_column, vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.csv");
        let samples = [Sample {
            pressure: Some(1000.5),
            ..Default::default()
        }];

        assert_eq!(export_csv(&path, &samples).unwrap(), 1);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().nth(1), Some("0,0,1000.5,0,,,,,,,,,,,,"));
    }

    #[test]
    fn unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("dir.csv");
        let none: [Sample; 0] = [];
        let err = export_csv(&path, &none).unwrap_err();
        match err {
            Error::Export { path: p, source } => {
                assert_eq!(p, path);
                assert!(matches!(*source, Error::Io(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_name_shape() {
        let name = default_file_name();
        assert!(name.starts_with("imu_data_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "imu_data_20240101_120000.csv".len());
    }
}
