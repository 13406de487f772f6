//! Level Meters
//!
//! Written by the audio thread once per `write`, read from anywhere.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Shared metering state between the chain and control/UI threads
pub struct Meters {
    /// Peak level left channel (stored as u32, interpreted as f32 bits)
    /// Rust pattern: AtomicF32 doesn't exist, so we use bit-casting
    peak_left_bits: AtomicU32,

    /// Peak level right channel
    peak_right_bits: AtomicU32,

    /// Compressor gain reduction in dB (<= 0.0)
    gain_reduction_bits: AtomicU32,

    /// Stereo frames processed since construction
    frames: AtomicU64,
}

impl Meters {
    pub fn new() -> Self {
        Self {
            peak_left_bits: AtomicU32::new(0.0_f32.to_bits()),
            peak_right_bits: AtomicU32::new(0.0_f32.to_bits()),
            gain_reduction_bits: AtomicU32::new(0.0_f32.to_bits()),
            frames: AtomicU64::new(0),
        }
    }

    pub fn set_peaks(&self, left: f32, right: f32) {
        // Relaxed: each meter is an independent value
        self.peak_left_bits.store(left.to_bits(), Ordering::Relaxed);
        self.peak_right_bits.store(right.to_bits(), Ordering::Relaxed);
    }

    /// Peak magnitudes of the last processed buffer, `(left, right)`
    pub fn peaks(&self) -> (f32, f32) {
        (
            f32::from_bits(self.peak_left_bits.load(Ordering::Relaxed)),
            f32::from_bits(self.peak_right_bits.load(Ordering::Relaxed)),
        )
    }

    pub fn set_gain_reduction_db(&self, db: f32) {
        self.gain_reduction_bits.store(db.to_bits(), Ordering::Relaxed);
    }

    pub fn gain_reduction_db(&self) -> f32 {
        f32::from_bits(self.gain_reduction_bits.load(Ordering::Relaxed))
    }

    pub fn add_frames(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::Relaxed);
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

impl Default for Meters {
    fn default() -> Self {
        Self::new()
    }
}
