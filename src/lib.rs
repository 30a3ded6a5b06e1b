//! Serial IMU telemetry ingestion.
//!
//! Bytes from the device are framed into lines ([`framer`]), parsed into
//! sparse [`Sample`]s ([`parser`]), and handed to a [`Session`] that keeps a
//! lossless archive next to a decimated, bounded display ring. The
//! [`IngestionPipeline`] runs the reader in the background and is the only
//! thing a UI needs to talk to.

pub mod buffers;
pub mod config;
pub mod decimator;
pub mod error;
pub mod export;
pub mod framer;
pub mod parser;
pub mod pipeline;
pub mod sample;
pub mod session;
pub mod source;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::IngestionPipeline;
pub use sample::Sample;
pub use session::{IngestStats, LinkState, Session};
