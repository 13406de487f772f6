//! Processing Chain
//!
//! Sits between the PCM producer (Bluetooth decoder) and the output sink.
//!
//! ```text
//!   bytes ──decode──▶ (+ beep) ──▶ processor ──encode──▶ scratch ──▶ sink
//!     LE i16 L/R        overlay      per frame     i16 × 32767
//! ```
//!
//! Frames are processed strictly in input order so filter and envelope
//! state stay continuous across buffers. The output buffer is allocated
//! once at construction and reused for every call.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info, trace, warn};

use catphones_dsp::{
    BeepOverlay, BeepState, PsychoacousticProcessor, StereoProcessor, STARTUP_BEEP_HZ,
    STARTUP_BEEP_MS,
};

use crate::config::{ChainConfig, BYTES_PER_FRAME};
use crate::control::ControlHandle;
use crate::error::{EngineError, EngineResult};
use crate::message::{Command, CommandTarget, COMMAND_QUEUE_CAPACITY};
use crate::meters::Meters;
use crate::sink::ByteSink;

/// Scale applied when re-encoding normalized samples to i16
const ENCODE_SCALE: f32 = 32767.0;

/// Scale applied when decoding i16 samples to normalized floats
const DECODE_SCALE: f32 = 32768.0;

#[inline]
fn decode(lo: u8, hi: u8) -> f32 {
    f32::from(i16::from_le_bytes([lo, hi])) / DECODE_SCALE
}

/// Truncating re-encode; `as` saturates, so out-of-range values can't wrap
#[inline]
fn encode(sample: f32) -> [u8; 2] {
    ((sample * ENCODE_SCALE) as i16).to_le_bytes()
}

/// Stream interceptor applying enhancement and beep overlay
pub struct ProcessingChain<S: ByteSink, P = PsychoacousticProcessor> {
    sink: S,
    processor: P,
    beep: BeepOverlay,
    /// Output buffer, `scratch_frames` frames long
    scratch: Vec<u8>,
    commands: Receiver<Command>,
    command_sender: Sender<Command>,
    meters: Arc<Meters>,
    startup_beep_pending: bool,
}

impl<S: ByteSink> ProcessingChain<S, PsychoacousticProcessor> {
    /// Create a chain with the psychoacoustic processor configured from `config`
    pub fn new(sink: S, config: ChainConfig) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;
        let processor =
            PsychoacousticProcessor::with_settings(config.sample_rate as f32, config.processor)?;
        Self::with_processor(sink, processor, config)
    }
}

impl<S, P> ProcessingChain<S, P>
where
    S: ByteSink,
    P: StereoProcessor + CommandTarget,
{
    /// Create a chain around any stereo processor
    pub fn with_processor(sink: S, processor: P, config: ChainConfig) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;

        let (command_sender, commands) = bounded(COMMAND_QUEUE_CAPACITY);

        info!(
            processor = processor.name(),
            sample_rate = config.sample_rate,
            scratch_frames = config.scratch_frames,
            "Processing chain created"
        );

        Ok(Self {
            sink,
            processor,
            beep: BeepOverlay::new(config.sample_rate),
            scratch: vec![0; config.scratch_bytes()],
            commands,
            command_sender,
            meters: Arc::new(Meters::new()),
            startup_beep_pending: true,
        })
    }

    /// Process interleaved LE i16 stereo PCM and forward it to the sink
    ///
    /// Returns the bytes the sink accepted. A trailing partial frame is
    /// ignored and never read. The first call after construction arms the
    /// startup beep.
    ///
    /// Every whole frame is processed, so filter, envelope and beep state
    /// advance by the full input even when the sink takes less. After the
    /// first short write the remaining blocks are no longer offered to it.
    ///
    /// # Real-time Safety
    /// No allocations. The beep lock is held while a block is processed,
    /// never across the sink write.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if self.startup_beep_pending {
            self.startup_beep_pending = false;
            self.beep.trigger(STARTUP_BEEP_HZ, STARTUP_BEEP_MS);
            debug!("Startup beep armed");
        }

        self.apply_pending_commands();

        let usable = data.len() - data.len() % BYTES_PER_FRAME;
        if usable < data.len() {
            trace!(dropped = data.len() - usable, "Ignoring trailing partial frame");
        }
        if usable == 0 {
            return 0;
        }

        let mut forwarded = 0;
        let mut sink_open = true;
        let mut peak_left = 0.0_f32;
        let mut peak_right = 0.0_f32;
        let mut frames = 0_u64;

        for block in data[..usable].chunks(self.scratch.len()) {
            let out = &mut self.scratch[..block.len()];

            {
                let mut beep = self.beep.lock();
                for (input, output) in block
                    .chunks_exact(BYTES_PER_FRAME)
                    .zip(out.chunks_exact_mut(BYTES_PER_FRAME))
                {
                    let mut left = decode(input[0], input[1]);
                    let mut right = decode(input[2], input[3]);

                    if beep.is_active() {
                        let tone = beep.advance();
                        left += tone;
                        right += tone;
                    }

                    let (left, right) = self.processor.process_frame(left, right);
                    peak_left = peak_left.max(left.abs());
                    peak_right = peak_right.max(right.abs());

                    output[..2].copy_from_slice(&encode(left));
                    output[2..].copy_from_slice(&encode(right));
                }
            }

            frames += (block.len() / BYTES_PER_FRAME) as u64;

            if sink_open {
                let accepted = self.sink.write(out);
                forwarded += accepted;
                if accepted < block.len() {
                    warn!(accepted, offered = block.len(), "Sink accepted a short write");
                    sink_open = false;
                }
            }
        }

        self.meters.set_peaks(peak_left, peak_right);
        self.meters.set_gain_reduction_db(self.processor.gain_reduction_db());
        self.meters.add_frames(frames);

        forwarded
    }

    /// Arm a beep; replaces a beep that is still playing
    pub fn trigger_beep(&self, frequency: f32, duration_ms: i32) {
        debug!(frequency, duration_ms, "Beep triggered");
        self.beep.trigger(frequency, duration_ms);
    }

    /// Handle for other threads: beeps, settings, meters
    pub fn control_handle(&self) -> ControlHandle {
        ControlHandle::new(
            self.command_sender.clone(),
            self.beep.clone(),
            Arc::clone(&self.meters),
        )
    }

    /// Apply every queued command to the processor
    fn apply_pending_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            debug!(?command, "Applying command");
            self.processor.apply(command);
        }
    }

    /// Consistent copy of the beep state
    pub fn beep_state(&self) -> BeepState {
        self.beep.snapshot()
    }

    pub fn meters(&self) -> Arc<Meters> {
        Arc::clone(&self.meters)
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Direct processor access, for setup or from the audio thread itself
    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Bytes the sink can hand back
    pub fn available(&self) -> usize {
        self.sink.available()
    }

    /// Read one byte back from the sink
    pub fn read(&mut self) -> Option<u8> {
        self.sink.read()
    }

    pub fn flush(&mut self) {
        self.sink.flush();
    }

    /// Capacity of the output buffer in frames
    pub fn scratch_frames(&self) -> usize {
        self.scratch.len() / BYTES_PER_FRAME
    }
}

/// The chain itself is a sink, so chains can feed chains
impl<S, P> ByteSink for ProcessingChain<S, P>
where
    S: ByteSink,
    P: StereoProcessor + CommandTarget,
{
    fn write(&mut self, bytes: &[u8]) -> usize {
        ProcessingChain::write(self, bytes)
    }

    fn flush(&mut self) {
        ProcessingChain::flush(self)
    }

    fn available(&self) -> usize {
        ProcessingChain::available(self)
    }

    fn read(&mut self) -> Option<u8> {
        ProcessingChain::read(self)
    }
}
