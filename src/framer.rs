use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Splits a byte stream on `\n`. A `\r` right before the terminator is dropped
/// as well, and invalid UTF-8 is replaced instead of failing the read.
#[derive(Debug, Default)]
pub struct LineCodec;

impl Decoder for LineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let newline = src.as_ref().iter().position(|b| *b == b'\n');
        if let Some(n) = newline {
            let line = src.split_to(n + 1);
            let mut text = &line[..n];
            if let Some((&b'\r', rest)) = text.split_last() {
                text = rest;
            }
            return Ok(Some(String::from_utf8_lossy(text).into_owned()));
        }
        Ok(None)
    }
}

/// Reassembles lines from arbitrarily chunked reads.
///
/// Whatever follows the last terminator of a chunk is kept and prefixed onto
/// the next one. The retained tail is unbounded; a device that never sends a
/// newline grows it forever.
#[derive(Debug, Default)]
pub struct Framer {
    buf: BytesMut,
    codec: LineCodec,
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns the lines it completed, lazily.
    /// Lines not pulled from the iterator stay buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Lines<'_> {
        self.buf.extend_from_slice(chunk);
        Lines { framer: self }
    }

    /// Bytes of the partial line waiting for its terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drops the partial line. It has no defined meaning on its own.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

pub struct Lines<'a> {
    framer: &'a mut Framer,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let Framer { buf, codec } = &mut *self.framer;
        // `LineCodec` never fails
        codec.decode(buf).ok().flatten()
    }
}
