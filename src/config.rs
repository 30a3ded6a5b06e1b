use std::fs::File;
use std::io::BufReader;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::source::BAUDRATES;

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "imu_monitor.json";

pub const MAX_DISPLAY_CAPACITY: usize = 100_000;

/// Application settings, stored as JSON. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Points kept for the live charts.
    pub display_capacity: usize,
    /// Full-rate samples per displayed sample.
    pub decimation_ratio: u32,
    /// Reader sleep when the port has nothing to give.
    pub idle_poll_ms: u64,
    pub redraw_interval_ms: u64,
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 115200,
            display_capacity: 1000,
            decimation_ratio: 20,
            idle_poll_ms: 5,
            redraw_interval_ms: 100,
            export_dir: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        log::info!("loaded config from '{}'", path.display());
        Ok(config)
    }

    /// An explicit `path` must load. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// used if it exists, and the defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("saved config to '{}'", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !BAUDRATES.contains(&self.baud_rate) {
            return Err(Error::InvalidConfig(format!(
                "unsupported baud rate {}",
                self.baud_rate
            )));
        }
        validate_display_capacity(self.display_capacity)?;
        validate_decimation_ratio(self.decimation_ratio)?;
        if !(1..=1000).contains(&self.idle_poll_ms) {
            return Err(Error::InvalidConfig(format!(
                "idle_poll_ms must be within 1..=1000, got {}",
                self.idle_poll_ms
            )));
        }
        if self.redraw_interval_ms < 10 {
            return Err(Error::InvalidConfig(format!(
                "redraw_interval_ms must be at least 10, got {}",
                self.redraw_interval_ms
            )));
        }
        Ok(())
    }

    pub fn display_capacity(&self) -> Result<NonZeroUsize> {
        validate_display_capacity(self.display_capacity)
    }

    pub fn decimation_ratio(&self) -> Result<NonZeroU32> {
        validate_decimation_ratio(self.decimation_ratio)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms)
    }
}

pub fn validate_display_capacity(capacity: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(capacity)
        .filter(|c| c.get() <= MAX_DISPLAY_CAPACITY)
        .ok_or_else(|| {
            Error::InvalidConfig(format!(
                "display capacity must be within 1..={MAX_DISPLAY_CAPACITY}, got {capacity}"
            ))
        })
}

pub fn validate_decimation_ratio(ratio: u32) -> Result<NonZeroU32> {
    NonZeroU32::new(ratio)
        .ok_or_else(|| Error::InvalidConfig("decimation ratio must be at least 1".into()))
}
