use std::fmt;
use std::num::{NonZeroU32, NonZeroUsize};

use crate::buffers::{Archive, DisplayRing};
use crate::decimator::Decimator;
use crate::error::{Error, Result};
use crate::sample::Sample;

pub const DEFAULT_DISPLAY_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(c) => c,
    None => unreachable!(),
};

const DEVICE_LOG_CAPACITY: NonZeroUsize = match NonZeroUsize::new(200) {
    Some(c) => c,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
    Collecting,
    Paused,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Disconnected => write!(f, "disconnected"),
            LinkState::Connected => write!(f, "connected"),
            LinkState::Collecting => write!(f, "collecting"),
            LinkState::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines: u64,
    pub samples: u64,
    /// Parsed while connected but not collecting.
    pub discarded: u64,
    pub non_data: u64,
}

/// Work produced by the reader from one chunk of bytes.
#[derive(Debug, Default)]
pub struct Batch {
    pub lines: u64,
    pub samples: Vec<Sample>,
    pub device_lines: Vec<String>,
}

/// Everything the reader writes and the UI reads, kept as one unit so that
/// archive, display ring and decimation counter can never disagree.
#[derive(Debug)]
pub struct Session {
    state: LinkState,
    /// Bumped on every connect and disconnect. Batches from a reader of an
    /// older connection are dropped.
    epoch: u64,
    archive: Archive,
    display: DisplayRing<Sample>,
    decimator: Decimator,
    device_log: DisplayRing<String>,
    stats: IngestStats,
}

impl Session {
    pub fn new(display_capacity: NonZeroUsize, decimation_ratio: NonZeroU32) -> Self {
        Self {
            state: LinkState::Disconnected,
            epoch: 0,
            archive: Archive::new(),
            display: DisplayRing::new(display_capacity),
            decimator: Decimator::new(decimation_ratio),
            device_log: DisplayRing::new(DEVICE_LOG_CAPACITY),
            stats: IngestStats::default(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Marks the link open and returns the epoch the new reader must present.
    pub fn connect(&mut self) -> u64 {
        self.epoch += 1;
        self.transition(LinkState::Connected);
        self.epoch
    }

    pub fn disconnect(&mut self) {
        self.epoch += 1;
        self.transition(LinkState::Disconnected);
    }

    /// Called by a reader whose source went away. Ignored if that reader has
    /// already been superseded.
    pub fn source_lost(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.disconnect();
        true
    }

    /// Begins collecting. From `Connected` this opens a new collection
    /// session with an empty archive and display; from `Paused` it behaves
    /// like [`Session::resume`].
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            LinkState::Connected => {
                self.archive.clear();
                self.display.clear();
                self.decimator.reset();
                self.transition(LinkState::Collecting);
                Ok(())
            }
            LinkState::Paused => self.resume(),
            LinkState::Collecting => Ok(()),
            LinkState::Disconnected => Err(Error::NotConnected),
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            LinkState::Collecting => {
                self.transition(LinkState::Paused);
                Ok(())
            }
            LinkState::Paused => Ok(()),
            from => Err(Error::InvalidTransition {
                from,
                request: "pause",
            }),
        }
    }

    /// Continues collecting. The decimation counter carries on where it was.
    pub fn resume(&mut self) -> Result<()> {
        match self.state {
            LinkState::Paused => {
                self.transition(LinkState::Collecting);
                Ok(())
            }
            LinkState::Collecting => Ok(()),
            from => Err(Error::InvalidTransition {
                from,
                request: "resume",
            }),
        }
    }

    /// Empties archive and display and restarts the decimation period. The
    /// link state is unchanged.
    pub fn clear(&mut self) {
        self.archive.clear();
        self.display.clear();
        self.decimator.reset();
        log::info!("session cleared");
    }

    pub fn set_display_capacity(&mut self, capacity: NonZeroUsize) {
        self.display.set_capacity(capacity);
    }

    pub fn set_decimation_ratio(&mut self, ratio: NonZeroU32) {
        self.decimator.set_ratio(ratio);
    }

    pub fn decimation_ratio(&self) -> NonZeroU32 {
        self.decimator.ratio()
    }

    pub fn display_capacity(&self) -> NonZeroUsize {
        self.display.capacity()
    }

    /// Archives a sample and offers it to the display path. Outside of
    /// `Collecting` the sample is counted as discarded and nothing changes.
    pub fn ingest(&mut self, sample: Sample) {
        if self.state != LinkState::Collecting {
            self.stats.discarded += 1;
            return;
        }

        self.stats.samples += 1;
        self.archive.push(sample);
        if self.decimator.select() {
            self.display.push(sample);
        }
    }

    /// Applies one reader batch. Returns `false` if `epoch` is stale.
    pub fn apply(&mut self, epoch: u64, batch: Batch) -> bool {
        if epoch != self.epoch {
            return false;
        }

        self.stats.lines += batch.lines;
        self.stats.non_data += batch.device_lines.len() as u64;
        for line in batch.device_lines {
            self.device_log.push(line);
        }
        for sample in batch.samples {
            self.ingest(sample);
        }
        true
    }

    pub fn display_snapshot(&self) -> Vec<Sample> {
        self.display.snapshot()
    }

    pub fn display_len(&self) -> usize {
        self.display.len()
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub fn device_log(&self) -> Vec<String> {
        self.device_log.snapshot()
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    fn transition(&mut self, to: LinkState) {
        if self.state != to {
            log::info!("{} -> {}", self.state, to);
            self.state = to;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_CAPACITY, Decimator::DEFAULT_RATIO)
    }
}
