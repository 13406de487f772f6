//! Soft Clipping
//!
//! Last stage of the enhancement chain. Keeps the processed signal inside
//! ±1.0 so the 16-bit re-encode can never wrap, without the hard corner of
//! a plain clamp.
//!
//! # Algorithm
//!
//! - At or below threshold: linear (unity gain)
//! - Above threshold: the excess is squeezed through tanh() into the
//!   remaining headroom, so the output approaches ±1.0 asymptotically

/// Threshold where the enhancement chain starts saturating
pub const SOFT_CLIP_THRESHOLD: f32 = 0.95;

/// Soft clipper with a fixed linear threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftClipper {
    threshold: f32,
}

impl SoftClipper {
    /// Create a soft clipper
    ///
    /// `threshold` is linear and clamped to `(0.0, 1.0]` so the ceiling
    /// never rises above full scale.
    pub fn new(threshold: f32) -> Self {
        let threshold = if threshold.is_finite() {
            threshold.clamp(f32::EPSILON, 1.0)
        } else {
            SOFT_CLIP_THRESHOLD
        };
        Self { threshold }
    }

    /// Current threshold in linear scale
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Process a single sample
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls, O(1) time.
    #[inline]
    pub fn process_sample(&self, sample: f32) -> f32 {
        soft_clip(sample, self.threshold)
    }
}

impl Default for SoftClipper {
    fn default() -> Self {
        Self::new(SOFT_CLIP_THRESHOLD)
    }
}

/// tanh-based saturation anchored at `threshold`
///
/// Input at threshold maps to output at threshold, polarity is preserved
/// and the output never exceeds ±1.0 for thresholds in `(0.0, 1.0]`.
#[inline]
pub fn soft_clip(sample: f32, threshold: f32) -> f32 {
    let abs_sample = sample.abs();

    if abs_sample <= threshold {
        sample
    } else {
        let sign = sample.signum();
        let excess = abs_sample - threshold;
        let headroom = 1.0 - threshold;

        // saturated_excess tends to headroom, so the output tends to 1.0
        let normalized_excess = excess / headroom.max(0.001);
        let saturated_excess = headroom * normalized_excess.tanh();

        sign * (threshold + saturated_excess)
    }
}
