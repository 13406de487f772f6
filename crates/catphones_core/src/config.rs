//! Chain Configuration

use serde::{Deserialize, Serialize};

use catphones_dsp::ProcessorSettings;

use crate::error::EngineResult;

/// Operating sample rate of the headphone pipeline (Hz)
pub const SAMPLE_RATE: u32 = 48000;

/// Interleaved channels in the wire format
pub const CHANNELS: usize = 2;

/// Bytes per 16-bit sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Bytes per stereo frame (L + R, 16-bit each)
pub const BYTES_PER_FRAME: usize = CHANNELS * BYTES_PER_SAMPLE;

/// Processing chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Sample rate in Hz, used for the bass filter and beep timing
    pub sample_rate: u32,

    /// Frames the pre-allocated output buffer holds; larger writes are
    /// processed in consecutive blocks of this size
    pub scratch_frames: usize,

    /// Enhancement settings applied at construction
    pub processor: ProcessorSettings,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            scratch_frames: 1024,
            processor: ProcessorSettings::default(),
        }
    }
}

impl ChainConfig {
    /// Configuration the headphones boot with
    pub fn speaker() -> Self {
        Self {
            processor: catphones_dsp::SPEAKER,
            ..Self::default()
        }
    }

    /// Default chain parameters with a named processor preset
    pub fn from_preset(name: &str) -> EngineResult<Self> {
        Ok(Self {
            processor: catphones_dsp::preset(name)?,
            ..Self::default()
        })
    }

    /// Size of the output scratch buffer in bytes
    pub fn scratch_bytes(&self) -> usize {
        self.scratch_frames * BYTES_PER_FRAME
    }

    /// Audio duration covered by one scratch block in milliseconds
    pub fn block_latency_ms(&self) -> f32 {
        (self.scratch_frames as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate < 8000 || self.sample_rate > 192000 {
            return Err(format!("Invalid sample rate: {}", self.sample_rate));
        }
        if self.scratch_frames < 32 || self.scratch_frames > 16384 {
            return Err(format!("Invalid scratch size: {}", self.scratch_frames));
        }
        Ok(())
    }
}
