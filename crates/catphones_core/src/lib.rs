//! Cat-Phones Core - Stream Interception
//!
//! This crate wires the DSP into the audio path of the headphones:
//! - Byte-level PCM framing (interleaved LE i16 stereo)
//! - Beep overlay (startup tone, button feedback)
//! - Command queue from control threads into the audio path
//! - Output sinks (ring buffer, any writer, optional device playback)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Control Threads                         │
//! │   buttons/menus ──▶ ControlHandle ──┬── trigger_beep ──┐   │
//! └─────────────────────────────────────┼──────────────────┼───┘
//!                       crossbeam-channel│      parking_lot│
//!                                        ▼                 ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   PCM bytes ──▶ ProcessingChain (+beep, enhance) ──▶ Sink  │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod chain;
mod config;
mod control;
mod error;
mod message;
mod meters;
#[cfg(feature = "playback")]
mod playback;
mod sink;

pub use chain::ProcessingChain;
pub use config::{ChainConfig, BYTES_PER_FRAME, BYTES_PER_SAMPLE, CHANNELS, SAMPLE_RATE};
pub use control::{ButtonTone, ControlHandle};
pub use error::{EngineError, EngineResult};
pub use message::{Command, CommandTarget, COMMAND_QUEUE_CAPACITY};
pub use meters::Meters;
#[cfg(feature = "playback")]
pub use playback::PlaybackStream;
pub use sink::{ring_pair, ByteSink, RingSink, RingSource, WriterSink};

// Re-export DSP types for convenience
pub use catphones_dsp::{BeepState, ProcessorSettings, PsychoacousticProcessor, StereoProcessor};
