//! Device Playback (feature `playback`)
//!
//! Plays the processed stream on a CPAL output device. The chain writes
//! into a [`RingSink`]; the device callback drains the matching
//! [`RingSource`].
//!
//! ```text
//!   ProcessingChain ──RingSink──▶ rtrb ──RingSource──▶ CPAL callback ──▶ DAC
//! ```

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig as CpalStreamConfig};
use tracing::{error, info};

use crate::config::{ChainConfig, CHANNELS};
use crate::error::{EngineError, EngineResult};
use crate::sink::{ring_pair, RingSink, RingSource};

/// Number of chain blocks the ring can hold before the chain sees short writes
const RING_BLOCKS: usize = 4;

/// A running output stream
pub struct PlaybackStream {
    /// The underlying CPAL stream (kept alive to maintain audio flow)
    #[allow(dead_code)]
    stream: Stream,
    device_name: String,
}

impl PlaybackStream {
    /// Open the default output device
    ///
    /// Returns the stream and the sink the chain should write into.
    pub fn open_default(config: &ChainConfig) -> EngineResult<(Self, RingSink)> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;
        Self::open(&device, config)
    }

    /// Open a specific output device
    pub fn open(device: &Device, config: &ChainConfig) -> EngineResult<(Self, RingSink)> {
        config.validate().map_err(EngineError::ConfigError)?;

        let (sink, source) = ring_pair(config.scratch_frames * RING_BLOCKS);

        let cpal_config = CpalStreamConfig {
            channels: CHANNELS as u16,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = Self::build_output_stream(device, &cpal_config, source)?;
        stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
        info!(device = %device_name, sample_rate = config.sample_rate, "Playback started");

        Ok((
            Self {
                stream,
                device_name,
            },
            sink,
        ))
    }

    fn build_output_stream(
        device: &Device,
        config: &CpalStreamConfig,
        mut source: RingSource,
    ) -> EngineResult<Stream> {
        device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Real-time audio callback - NO allocations allowed here
                    let read = source.pop_samples(data);
                    // Underrun - pad with silence
                    data[read..].fill(0.0);
                },
                move |err| {
                    error!("Output stream error: {}", err);
                },
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}
