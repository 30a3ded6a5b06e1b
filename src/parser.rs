//! Field extraction for the device's `key=value` telemetry lines.
//!
//! ```text
//! ts=<int> T=<int>C EUL(deg)=<f>,<f>,<f> ACC(g)=<f>,<f>,<f>
//! GYR(dps)=<f>,<f>,<f> MAG(uT)=<f>,<f>,<f> P=<f> FPS(inst)=<f>
//! ```
//!
//! Each field is matched on its own, in any order, with arbitrary text in
//! between. A field that is missing or malformed is left out; the rest of the
//! line still parses.

use std::str::FromStr;
use std::sync::LazyLock;

use nalgebra::Vector3;
use regex::Regex;

use crate::sample::Sample;

/// Marker every data line carries. Used as a cheap filter ahead of [`parse_line`].
pub const DATA_MARKER: &str = "ts=";

macro_rules! num {
    () => {
        r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?"
    };
}

macro_rules! vector_pattern {
    ($key:literal) => {
        concat!(
            $key,
            r"=\s*(",
            num!(),
            r")\s*,\s*(",
            num!(),
            r")\s*,\s*(",
            num!(),
            r")"
        )
    };
}

static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(concat!(r"\bts=(", num!(), ")")).expect("timestamp regex"));
static TEMPERATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(concat!(r"\bT=(", num!(), ")C")).expect("temperature regex"));
static PRESSURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(concat!(r"\bP=(", num!(), ")")).expect("pressure regex"));
static FPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(concat!(r"FPS\(inst\)=(", num!(), ")")).expect("fps regex"));

static EULER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(vector_pattern!(r"EUL\(deg\)")).expect("euler regex"));
static ACCEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(vector_pattern!(r"ACC\(g\)")).expect("accel regex"));
static GYRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(vector_pattern!(r"GYR\(dps\)")).expect("gyro regex"));
static MAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(vector_pattern!(r"MAG\(uT\)")).expect("mag regex"));

/// A fourth numeric component right after a vector. Makes the vector invalid.
static TRAILING_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(concat!(r"^\s*,\s*", num!())).expect("trailing regex"));

pub fn is_data_line(line: &str) -> bool {
    line.contains(DATA_MARKER)
}

/// Parses one trimmed line. `None` if not a single field matched.
pub fn parse_line(line: &str) -> Option<Sample> {
    let sample = Sample {
        timestamp: scalar(&TIMESTAMP, line),
        temperature: scalar(&TEMPERATURE, line),
        euler: vector(&EULER, line),
        accel: vector(&ACCEL, line),
        gyro: vector(&GYRO, line),
        mag: vector(&MAG, line),
        pressure: scalar(&PRESSURE, line),
        fps: scalar(&FPS, line),
    };

    (!sample.is_empty()).then_some(sample)
}

fn scalar<T: FromStr>(re: &Regex, line: &str) -> Option<T> {
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

fn vector(re: &Regex, line: &str) -> Option<Vector3<f64>> {
    let caps = re.captures(line)?;
    let end = caps.get(0)?.end();
    if TRAILING_COMPONENT.is_match(&line[end..]) {
        return None;
    }

    let component = |i: usize| caps.get(i)?.as_str().parse::<f64>().ok();
    Some(Vector3::new(component(1)?, component(2)?, component(3)?))
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::vector;

    const FULL: &str = "ts=123456 T=25C EUL(deg)=10.5,-20.25,180 ACC(g)=0.01,-0.02,0.98 \
                        GYR(dps)=1.5,2.5,-3.5 MAG(uT)=30.1,-12.4,45 P=1013.25 FPS(inst)=998.7";

    #[test]
    fn full_line() {
        let s = parse_line(FULL).unwrap();
        assert_eq!(s.timestamp, Some(123456));
        assert_eq!(s.temperature, Some(25));
        assert_eq!(s.euler, Some(vector![10.5, -20.25, 180.0]));
        assert_eq!(s.accel, Some(vector![0.01, -0.02, 0.98]));
        assert_eq!(s.gyro, Some(vector![1.5, 2.5, -3.5]));
        assert_eq!(s.mag, Some(vector![30.1, -12.4, 45.0]));
        assert_eq!(s.pressure, Some(1013.25));
        assert_eq!(s.fps, Some(998.7));
    }

    #[test]
    fn accel_only() {
        let s = parse_line("ACC(g)=1.0,2.0,3.0").unwrap();
        assert_eq!(
            s,
            Sample {
                accel: Some(vector![1.0, 2.0, 3.0]),
                ..Default::default()
            }
        );
    }

    #[test]
    fn non_data_lines() {
        assert_eq!(parse_line("READY"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("Sample rate set to 1000 Hz"), None);
        assert!(!is_data_line("READY"));
        assert!(is_data_line(FULL));
    }

    #[test]
    fn field_order_does_not_matter() {
        let a = parse_line("ts=5 P=1000.5 ACC(g)=1,2,3").unwrap();
        let b = parse_line("ACC(g)=1,2,3 | P=1000.5 | ts=5").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn partial_vector_is_absent() {
        let s = parse_line("ts=1 ACC(g)=1.0,2.0 GYR(dps)=4,5,6").unwrap();
        assert_eq!(s.accel, None);
        assert_eq!(s.gyro, Some(vector![4.0, 5.0, 6.0]));
    }

    #[test]
    fn four_component_vector_is_absent() {
        let s = parse_line("ts=1 MAG(uT)=1,2,3,4").unwrap();
        assert_eq!(s.mag, None);
        assert_eq!(s.timestamp, Some(1));
    }

    #[test]
    fn comma_separated_fields() {
        let s = parse_line("ts=7, ACC(g)=1,2,3, T=20C").unwrap();
        assert_eq!(s.accel, Some(vector![1.0, 2.0, 3.0]));
        assert_eq!(s.temperature, Some(20));
    }

    #[test]
    fn malformed_field_is_skipped_others_kept() {
        let s = parse_line("ts=abc T=21C EUL(deg)=1,x,3 P=999.5").unwrap();
        assert_eq!(s.timestamp, None);
        assert_eq!(s.euler, None);
        assert_eq!(s.temperature, Some(21));
        assert_eq!(s.pressure, Some(999.5));
    }

    #[test]
    fn non_integer_temperature_is_skipped() {
        let s = parse_line("ts=1 T=21.5C").unwrap();
        assert_eq!(s.temperature, None);
        assert_eq!(s.timestamp, Some(1));
    }

    #[test]
    fn overflowing_timestamp_is_skipped() {
        let s = parse_line("ts=99999999999999999999999 P=1.5").unwrap();
        assert_eq!(s.timestamp, None);
        assert_eq!(s.pressure, Some(1.5));
    }

    #[test]
    fn scientific_notation_and_signs() {
        let s = parse_line("ts=-3 ACC(g)=1e-3,+2.5E2,-.5").unwrap();
        assert_eq!(s.timestamp, Some(-3));
        assert_eq!(s.accel, Some(vector![0.001, 250.0, -0.5]));
    }

    #[test]
    fn markers_inside_other_words_do_not_match() {
        // "pts=" and "XP=" are not the timestamp and pressure fields
        assert_eq!(parse_line("pts=12 XP=3.5"), None);
    }

    #[test]
    fn parsing_is_pure() {
        let lines = [FULL, "READY", "ts=1 ACC(g)=1,2", "ts=2 T=30C"];
        let first: Vec<_> = lines.iter().map(|l| parse_line(l)).collect();
        for _ in 0..3 {
            let again: Vec<_> = lines.iter().map(|l| parse_line(l)).collect();
            assert_eq!(first, again);
        }
    }
}
