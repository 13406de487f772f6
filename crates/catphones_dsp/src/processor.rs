//! Stereo Processor Trait
//!
//! Defines the per-frame interface the processing chain drives.
//! Lets the chain run the psychoacoustic processor or a test double.

/// Trait for per-frame stereo processors
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process_frame()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - NO unbounded loops
/// - Constant time per frame
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait StereoProcessor: Send {
    /// Process one stereo sample pair, returning `(left, right)`
    fn process_frame(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Reset internal state (filters, envelopes, etc.)
    fn reset(&mut self);

    /// Human-readable name for debugging/logging
    fn name(&self) -> &'static str;

    /// Whether this processor is currently enabled
    fn is_enabled(&self) -> bool {
        true
    }

    /// Gain reduction currently applied, in dB (0.0 = none), for metering
    fn gain_reduction_db(&self) -> f32 {
        0.0
    }

    /// Process an interleaved stereo buffer in-place
    ///
    /// Buffer format: [L0, R0, L1, R1, ...]. A trailing odd sample is
    /// left untouched.
    #[inline]
    fn process_interleaved(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            let (l, r) = self.process_frame(frame[0], frame[1]);
            frame[0] = l;
            frame[1] = r;
        }
    }
}
