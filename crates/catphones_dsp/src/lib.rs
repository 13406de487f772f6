//! Cat-Phones DSP - Digital Signal Processing Module
//!
//! This crate provides the sample-level processing for Cat-Phones:
//! - Psychoacoustic enhancer (compressor, bass shelf, presence, master gain)
//! - tanh soft clipper keeping the output inside ±1.0
//! - Beep overlay tone generator shared with control threads
//! - Built-in enhancement presets
//!
//! # Architecture
//!
//! Everything on the sample path is allocation-free and infallible.
//! Errors only surface when components are constructed.

mod beep;
mod error;
mod presets;
mod processor;
mod psychoacoustic;
mod soft_clip;

pub use beep::{
    BeepOverlay, BeepState, BEEP_AMPLITUDE, DEFAULT_BEEP_MS, STARTUP_BEEP_HZ, STARTUP_BEEP_MS,
};
pub use error::DspError;
pub use presets::{preset, Preset, PRESETS, SPEAKER};
pub use processor::StereoProcessor;
pub use psychoacoustic::{
    lowpass_coefficient, ProcessorSettings, PsychoacousticProcessor, ATTACK_COEFF,
    BASS_CUTOFF_HZ, RELEASE_COEFF,
};
pub use soft_clip::{soft_clip, SoftClipper, SOFT_CLIP_THRESHOLD};
