//! Output Sinks
//!
//! The chain forwards processed PCM to anything implementing [`ByteSink`].
//!
//! - [`RingSink`] / [`RingSource`]: SPSC byte ring between the chain and an
//!   output callback (see the `playback` feature)
//! - [`WriterSink`]: any `std::io::Write` (stdout, files, `Vec<u8>`)

use std::io::Write;

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{trace, warn};

use crate::config::BYTES_PER_FRAME;

/// Minimal byte-sink capability the chain writes into
///
/// Implementations must not panic; a sink that can't take data reports
/// fewer accepted bytes instead.
pub trait ByteSink: Send {
    /// Write bytes, returning how many were accepted
    fn write(&mut self, bytes: &[u8]) -> usize;

    /// Push out anything buffered
    fn flush(&mut self);

    /// Bytes that can be read back through [`ByteSink::read`]
    fn available(&self) -> usize;

    /// Read one byte back, if the sink offers any
    fn read(&mut self) -> Option<u8>;
}

impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn write(&mut self, bytes: &[u8]) -> usize {
        (**self).write(bytes)
    }

    fn flush(&mut self) {
        (**self).flush()
    }

    fn available(&self) -> usize {
        (**self).available()
    }

    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }
}

/// Create a connected ring sink/source pair holding `capacity_frames` frames
pub fn ring_pair(capacity_frames: usize) -> (RingSink, RingSource) {
    let (producer, consumer) = RingBuffer::<u8>::new(capacity_frames * BYTES_PER_FRAME);
    (RingSink { producer }, RingSource { consumer })
}

/// Producer side of the byte ring
///
/// Only whole frames are accepted so the consumer never sees a torn
/// left/right pair.
pub struct RingSink {
    producer: Producer<u8>,
}

impl RingSink {
    /// Free space in bytes
    pub fn free_bytes(&self) -> usize {
        self.producer.slots()
    }

    /// Total ring size in bytes
    pub fn capacity_bytes(&self) -> usize {
        self.producer.buffer().capacity()
    }

    /// Bytes written but not yet consumed
    pub fn pending_bytes(&self) -> usize {
        self.capacity_bytes() - self.producer.slots()
    }

    /// Whether the consumer side has been dropped
    pub fn is_abandoned(&self) -> bool {
        self.producer.is_abandoned()
    }
}

impl ByteSink for RingSink {
    fn write(&mut self, bytes: &[u8]) -> usize {
        let fits = bytes.len().min(self.producer.slots());
        let len = fits - fits % BYTES_PER_FRAME;
        if len == 0 {
            return 0;
        }

        match self.producer.write_chunk_uninit(len) {
            Ok(chunk) => chunk.fill_from_iter(bytes[..len].iter().copied()),
            Err(_) => 0,
        }
    }

    fn flush(&mut self) {
        // The consumer drains on its own schedule
        trace!(pending = self.pending_bytes(), "Ring flush");
    }

    fn available(&self) -> usize {
        0
    }

    fn read(&mut self) -> Option<u8> {
        None
    }
}

/// Consumer side of the byte ring
pub struct RingSource {
    consumer: Consumer<u8>,
}

impl RingSource {
    /// Bytes waiting in the ring
    pub fn available_bytes(&self) -> usize {
        self.consumer.slots()
    }

    /// Pop whole frames as normalized f32 samples into `out`
    ///
    /// Returns the number of samples written; the rest of `out` is left
    /// untouched.
    ///
    /// # Real-time Safety
    /// No allocations, no locks.
    pub fn pop_samples(&mut self, out: &mut [f32]) -> usize {
        let frames = (out.len() / 2).min(self.consumer.slots() / BYTES_PER_FRAME);
        if frames == 0 {
            return 0;
        }

        let Ok(chunk) = self.consumer.read_chunk(frames * BYTES_PER_FRAME) else {
            return 0;
        };

        let mut bytes = chunk.into_iter();
        let mut written = 0;
        while let (Some(lo), Some(hi)) = (bytes.next(), bytes.next()) {
            out[written] = f32::from(i16::from_le_bytes([lo, hi])) / 32768.0;
            written += 1;
        }
        written
    }
}

/// Sink forwarding to any writer
///
/// Write errors are logged and reported as zero accepted bytes.
pub struct WriterSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ByteSink for WriterSink<W> {
    fn write(&mut self, bytes: &[u8]) -> usize {
        match self.writer.write_all(bytes) {
            Ok(()) => bytes.len(),
            Err(e) => {
                warn!("Output write failed: {}", e);
                0
            }
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!("Output flush failed: {}", e);
        }
    }

    fn available(&self) -> usize {
        0
    }

    fn read(&mut self) -> Option<u8> {
        None
    }
}
