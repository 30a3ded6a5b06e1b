use std::path::PathBuf;

use thiserror::Error;

use crate::session::LinkState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The export destination could not be written. The archive is untouched.
    #[error("failed to export to '{}': {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot {request} while {from}")]
    InvalidTransition {
        from: LinkState,
        request: &'static str,
    },

    #[error("not connected to a device")]
    NotConnected,

    #[error("no async runtime to run the reader on: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}
