//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while setting up DSP components
///
/// The per-sample path never fails; these only surface at construction
/// or preset lookup.
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}
