//! Background ingestion and the control surface the UI talks to.
//!
//! One reader task per connection drains the [`ByteSource`], frames and
//! parses outside of any lock, then hands each chunk's results to the shared
//! [`Session`] in a single locked step. The UI side only ever copies state out
//! of the session (`display_snapshot`, `export`) or flips its state.

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::prelude::*;
use parking_lot::Mutex;
use stream_cancel::{StreamExt, Trigger, Tripwire};
use tokio::task::JoinHandle;

use crate::buffers::ArchiveSnapshot;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::export;
use crate::framer::Framer;
use crate::parser;
use crate::sample::Sample;
use crate::session::{Batch, IngestStats, LinkState, Session};
use crate::source::{ByteSource, CommandSink};

pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(5);

struct Reader {
    trigger: Trigger,
    handle: JoinHandle<()>,
}

pub struct IngestionPipeline {
    session: Arc<Mutex<Session>>,
    reader: Option<Reader>,
    sink: Option<Box<dyn CommandSink>>,
    idle_poll: Duration,
}

impl IngestionPipeline {
    pub fn new(
        display_capacity: NonZeroUsize,
        decimation_ratio: NonZeroU32,
        idle_poll: Duration,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new(display_capacity, decimation_ratio))),
            reader: None,
            sink: None,
            idle_poll,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.display_capacity()?,
            config.decimation_ratio()?,
            config.idle_poll(),
        ))
    }

    /// Attaches an open source and starts reading it on the current tokio
    /// runtime. Any previous connection is dropped first.
    pub fn connect<S>(&mut self, source: S, sink: Option<Box<dyn CommandSink>>) -> Result<()>
    where
        S: ByteSource + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()?;
        self.stop_reader();

        let epoch = self.session.lock().connect();
        let (trigger, tripwire) = Tripwire::new();
        let handle = runtime.spawn(read_loop(
            source,
            Arc::clone(&self.session),
            epoch,
            tripwire,
            self.idle_poll,
        ));

        self.reader = Some(Reader { trigger, handle });
        self.sink = sink;
        Ok(())
    }

    /// Stops the reader without waiting for it. It exits within one idle
    /// poll; the partial line it was holding is dropped.
    pub fn disconnect(&mut self) {
        self.stop_reader();
        self.sink = None;
        self.session.lock().disconnect();
    }

    /// Like [`IngestionPipeline::disconnect`], but waits until the reader has
    /// closed the source.
    pub async fn shutdown(&mut self) {
        let handle = self.stop_reader();
        self.sink = None;
        self.session.lock().disconnect();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::warn!("reader task failed: {e}");
            }
        }
    }

    /// Whether a reader task is still running. `false` after a disconnect or
    /// once the source has gone away.
    pub fn is_reading(&self) -> bool {
        self.reader
            .as_ref()
            .is_some_and(|reader| !reader.handle.is_finished())
    }

    pub fn start(&self) -> Result<()> {
        self.session.lock().start()
    }

    pub fn pause(&self) -> Result<()> {
        self.session.lock().pause()
    }

    pub fn resume(&self) -> Result<()> {
        self.session.lock().resume()
    }

    pub fn clear(&self) {
        self.session.lock().clear();
    }

    pub fn set_display_capacity(&self, capacity: NonZeroUsize) {
        self.session.lock().set_display_capacity(capacity);
    }

    pub fn display_capacity(&self) -> NonZeroUsize {
        self.session.lock().display_capacity()
    }

    pub fn set_decimation_ratio(&self, ratio: NonZeroU32) {
        self.session.lock().set_decimation_ratio(ratio);
    }

    pub fn decimation_ratio(&self) -> NonZeroU32 {
        self.session.lock().decimation_ratio()
    }

    pub fn state(&self) -> LinkState {
        self.session.lock().state()
    }

    pub fn display_snapshot(&self) -> Vec<Sample> {
        self.session.lock().display_snapshot()
    }

    pub fn display_count(&self) -> usize {
        self.session.lock().display_len()
    }

    pub fn archive_count(&self) -> usize {
        self.session.lock().archive().len()
    }

    /// The whole archive as of now. Cheap to take; the lock is held only
    /// while the open tail is copied.
    pub fn archive_snapshot(&self) -> ArchiveSnapshot {
        self.session.lock().archive().snapshot()
    }

    pub fn device_log(&self) -> Vec<String> {
        self.session.lock().device_log()
    }

    pub fn stats(&self) -> IngestStats {
        self.session.lock().stats()
    }

    /// Writes `text` to the device as-is.
    pub fn send_command(&mut self, text: &str) -> Result<()> {
        if self.state() == LinkState::Disconnected {
            return Err(Error::NotConnected);
        }
        let sink = self.sink.as_mut().ok_or(Error::NotConnected)?;
        sink.send(text)?;
        log::info!("sent command {text:?}");
        Ok(())
    }

    /// Writes the archive to `path` as CSV and returns the number of rows.
    ///
    /// Ingestion keeps running; the file holds the archive as it was when the
    /// export began.
    pub fn export(&self, path: &Path) -> Result<usize> {
        let snapshot = self.archive_snapshot();
        export::export_csv(path, snapshot.iter())
    }

    fn stop_reader(&mut self) -> Option<JoinHandle<()>> {
        let reader = self.reader.take()?;
        reader.trigger.cancel();
        Some(reader.handle)
    }
}

/// Polls `source` until it reports closed, sleeping `idle_poll` whenever it
/// has nothing to give.
fn chunks<'a, S>(source: &'a mut S, idle_poll: Duration) -> impl Stream<Item = Bytes> + 'a
where
    S: ByteSource + 'a,
{
    futures::stream::unfold(source, move |source| async move {
        loop {
            if !source.is_open() {
                return None;
            }
            match source.read_available() {
                Ok(bytes) if !bytes.is_empty() => return Some((bytes, source)),
                Ok(_) => {}
                Err(e) => log::debug!("read failed, retrying: {e}"),
            }
            tokio::time::sleep(idle_poll).await;
        }
    })
}

async fn read_loop<S: ByteSource>(
    mut source: S,
    session: Arc<Mutex<Session>>,
    epoch: u64,
    tripwire: Tripwire,
    idle_poll: Duration,
) {
    let mut framer = Framer::new();

    {
        let incoming = chunks(&mut source, idle_poll).take_until_if(tripwire);
        futures::pin_mut!(incoming);

        while let Some(bytes) = incoming.next().await {
            let batch = frame(&mut framer, &bytes);
            if !session.lock().apply(epoch, batch) {
                log::debug!("reader superseded, stopping");
                break;
            }
        }
    }

    source.close();
    if framer.pending() > 0 {
        log::debug!("dropping {} bytes of unterminated line", framer.pending());
    }
    if session.lock().source_lost(epoch) {
        log::warn!("serial source closed");
    }
}

/// Frames one chunk and parses the lines it completed.
fn frame(framer: &mut Framer, chunk: &[u8]) -> Batch {
    let mut batch = Batch::default();

    for line in framer.push(chunk) {
        batch.lines += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if parser::is_data_line(line) {
            if let Some(sample) = parser::parse_line(line) {
                batch.samples.push(sample);
                continue;
            }
        }

        log::debug!("device: {line}");
        batch.device_lines.push(line.to_owned());
    }

    batch
}
