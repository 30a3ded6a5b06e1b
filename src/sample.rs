use nalgebra::Vector3;

/// One telemetry record. Every field is optional and set independently of the
/// others; a parse that sets nothing is not a sample at all.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// Device-local tick, arbitrary epoch.
    pub timestamp: Option<i64>,
    /// °C
    pub temperature: Option<i32>,
    /// Roll, pitch, yaw in degrees.
    pub euler: Option<Vector3<f64>>,
    /// g
    pub accel: Option<Vector3<f64>>,
    /// deg/s
    pub gyro: Option<Vector3<f64>>,
    /// µT
    pub mag: Option<Vector3<f64>>,
    /// hPa
    pub pressure: Option<f64>,
    /// Hz, the device's instantaneous output rate.
    pub fps: Option<f64>,
}

impl Sample {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::vector;

    #[test]
    fn default_is_empty() {
        assert!(Sample::default().is_empty());
    }

    #[test]
    fn any_field_makes_it_non_empty() {
        let s = Sample {
            gyro: Some(vector![0.0, 0.0, 0.0]),
            ..Default::default()
        };
        assert!(!s.is_empty());

        let s = Sample {
            temperature: Some(0),
            ..Default::default()
        };
        assert!(!s.is_empty());
    }
}
