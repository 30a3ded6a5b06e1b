use std::io::{self, Read, Write};

use bytes::Bytes;
use tokio_serial::SerialPort;

use crate::error::Result;

pub const BAUDRATES: [u32; 9] = [
    4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

const MAX_READ: usize = 4096;

/// Where the pipeline's bytes come from.
pub trait ByteSource: Send {
    /// Returns whatever bytes are available right now, possibly none.
    /// Must not wait for data to arrive.
    fn read_available(&mut self) -> io::Result<Bytes>;

    fn is_open(&self) -> bool;

    fn close(&mut self);
}

/// Text commands to the device, e.g. a sample rate change. The pipeline does
/// not interpret them.
pub trait CommandSink: Send {
    fn send(&mut self, text: &str) -> io::Result<()>;
}

/// Opens `port_name` as 8-N-1 and returns its read and write halves.
pub fn open_serial(port_name: &str, baud_rate: u32) -> Result<(SerialSource, SerialCommandSink)> {
    let mut port = tokio_serial::new(port_name, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .flow_control(tokio_serial::FlowControl::None)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .open()?;
    port.write_data_terminal_ready(true)?; // dtr: required for Arduinos to send data
    let writer = port.try_clone()?;
    log::info!("Open serial port: {port_name} @ {baud_rate}");

    Ok((SerialSource::new(port), SerialCommandSink { port: writer }))
}

/// Lists ports worth offering to the user.
pub fn available_ports() -> Vec<tokio_serial::SerialPortInfo> {
    match tokio_serial::available_ports() {
        Ok(ports) => ports
            .into_iter()
            // remove /dev/ttySx.
            .filter(|p| !p.port_name.contains("/dev/ttyS"))
            .collect(),
        Err(e) => {
            log::warn!("port enumeration failed: {e}");
            vec![]
        }
    }
}

pub struct SerialSource {
    port: Option<Box<dyn SerialPort>>,
    buf: Vec<u8>,
}

impl SerialSource {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            port: Some(port),
            buf: vec![0; MAX_READ],
        }
    }

    /// Timeouts and interrupted calls are retried. Anything else means the
    /// device is gone (EIO after a hang-up surfaces as `Other`), so the port
    /// is dropped and the reader stops.
    fn read_failed(&mut self, e: io::Error) -> io::Result<Bytes> {
        if is_transient(e.kind()) {
            log::debug!("serial read retry: {e}");
            return Ok(Bytes::new());
        }
        log::warn!("serial device went away: {e}");
        self.port = None;
        Err(e)
    }
}

fn is_transient(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

impl ByteSource for SerialSource {
    fn read_available(&mut self) -> io::Result<Bytes> {
        let Some(port) = self.port.as_mut() else {
            return Ok(Bytes::new());
        };

        let available = match port.bytes_to_read() {
            Ok(n) => n as usize,
            Err(e) => return self.read_failed(e.into()),
        };
        if available == 0 {
            return Ok(Bytes::new());
        }

        let want = available.min(self.buf.len());
        let read = port.read(&mut self.buf[..want]);
        match read {
            Ok(n) => Ok(Bytes::copy_from_slice(&self.buf[..n])),
            Err(e) => self.read_failed(e),
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            log::info!("serial port closed");
        }
    }
}

pub struct SerialCommandSink {
    port: Box<dyn SerialPort>,
}

impl CommandSink for SerialCommandSink {
    fn send(&mut self, text: &str) -> io::Result<()> {
        self.port.write_all(text.as_bytes())?;
        self.port.flush()
    }
}
