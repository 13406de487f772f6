//! Beep Overlay Generator
//!
//! A short sine tone mixed additively into the program audio for user
//! feedback (startup, button presses).
//!
//! # Threading
//!
//! The audio thread advances the tone while control threads may re-arm it
//! at any moment. Frequency, phase, countdown and the active flag are only
//! meaningful together, so they live in one record behind a single
//! `parking_lot::Mutex`. The audio path takes the lock once per buffer;
//! a trigger holds it for four stores.

use std::f32::consts::PI;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// Peak amplitude of the overlay tone (linear, normalized samples)
pub const BEEP_AMPLITUDE: f32 = 0.2;

/// Tone armed by the first buffer after construction
pub const STARTUP_BEEP_HZ: f32 = 1200.0;
pub const STARTUP_BEEP_MS: i32 = 40;

/// Duration used when a caller doesn't pick one
pub const DEFAULT_BEEP_MS: i32 = 30;

/// Beep overlay state
///
/// Plain data; share it through [`BeepOverlay`].
#[derive(Debug, Clone, PartialEq)]
pub struct BeepState {
    sample_rate: u32,
    frequency: f32,
    /// Normalized phase in [0.0, 1.0)
    phase: f32,
    remaining: i64,
    active: bool,
}

impl BeepState {
    /// Create an inactive beep for the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frequency: STARTUP_BEEP_HZ,
            phase: 0.0,
            remaining: 0,
            active: false,
        }
    }

    /// Arm a tone, replacing any tone still playing
    ///
    /// A non-positive frequency or a duration shorter than one sample leaves
    /// the beep inactive.
    pub fn trigger(&mut self, frequency: f32, duration_ms: i32) {
        self.frequency = frequency;
        self.phase = 0.0;
        self.remaining = i64::from(self.sample_rate) * i64::from(duration_ms) / 1000;
        self.active = self.remaining > 0 && frequency > 0.0;
    }

    /// Produce the next overlay sample and advance one sample period
    ///
    /// Returns 0.0 once the countdown has run out.
    ///
    /// # Real-time Safety
    /// No allocations, O(1) time.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }

        let sample = (2.0 * PI * self.phase).sin() * BEEP_AMPLITUDE;

        self.phase += self.frequency / self.sample_rate as f32;
        if self.phase >= 1.0 {
            self.phase = self.phase.fract();
        }

        self.remaining -= 1;
        if self.remaining <= 0 {
            self.active = false;
        }

        sample
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Samples left before the tone stops (0 when inactive)
    pub fn remaining(&self) -> u64 {
        if self.active {
            self.remaining.max(0) as u64
        } else {
            0
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Shared, lock-guarded beep state
///
/// Cheap to clone; every clone refers to the same tone.
#[derive(Debug, Clone)]
pub struct BeepOverlay {
    state: Arc<Mutex<BeepState>>,
}

impl BeepOverlay {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(BeepState::new(sample_rate))),
        }
    }

    /// Arm a tone from any thread
    pub fn trigger(&self, frequency: f32, duration_ms: i32) {
        self.state.lock().trigger(frequency, duration_ms);
    }

    /// Advance a single sample under the lock
    ///
    /// For whole buffers prefer [`BeepOverlay::lock`] and call
    /// [`BeepState::advance`] on the guard.
    pub fn advance(&self) -> f32 {
        self.state.lock().advance()
    }

    /// Hold the state for a batch of samples
    pub fn lock(&self) -> MutexGuard<'_, BeepState> {
        self.state.lock()
    }

    /// Consistent copy of the current state
    pub fn snapshot(&self) -> BeepState {
        self.state.lock().clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_inactive() {
        let mut beep = BeepState::new(48000);
        assert!(!beep.is_active());
        assert_eq!(beep.remaining(), 0);
        assert_eq!(beep.advance(), 0.0);
    }

    #[test]
    fn test_countdown_length() {
        let mut beep = BeepState::new(48000);
        beep.trigger(1200.0, 40);
        assert!(beep.is_active());
        assert_eq!(beep.remaining(), 1920);

        for i in 0..1920 {
            assert!(beep.is_active(), "went inactive early at sample {}", i);
            beep.advance();
        }
        assert!(!beep.is_active());
        assert_eq!(beep.advance(), 0.0);
    }

    #[test]
    fn test_first_sample_starts_at_zero_phase() {
        let mut beep = BeepState::new(48000);
        beep.trigger(1000.0, 10);
        assert_eq!(beep.advance(), 0.0);

        // Quarter period later the sine peaks
        let mut beep = BeepState::new(48000);
        beep.trigger(12000.0, 10);
        beep.advance();
        let peak = beep.advance();
        assert!((peak - BEEP_AMPLITUDE).abs() < 1e-6);
    }

    #[test]
    fn test_phase_wraps() {
        let mut beep = BeepState::new(48000);
        beep.trigger(1200.0, 1000);

        for _ in 0..10_000 {
            beep.advance();
            assert!(beep.phase() >= 0.0 && beep.phase() < 1.0);
        }
    }

    #[test]
    fn test_phase_wraps_above_nyquist() {
        let mut beep = BeepState::new(48000);
        beep.trigger(100_000.0, 10);
        for _ in 0..100 {
            let s = beep.advance();
            assert!(s.abs() <= BEEP_AMPLITUDE);
            assert!(beep.phase() < 1.0);
        }
    }

    #[test]
    fn test_amplitude_bounded() {
        let mut beep = BeepState::new(48000);
        beep.trigger(440.0, 100);
        while beep.is_active() {
            assert!(beep.advance().abs() <= BEEP_AMPLITUDE + 1e-6);
        }
    }

    #[test]
    fn test_retrigger_overwrites() {
        let mut beep = BeepState::new(48000);
        beep.trigger(1200.0, 40);
        for _ in 0..1000 {
            beep.advance();
        }

        beep.trigger(500.0, 10);
        assert_eq!(beep.frequency(), 500.0);
        assert_eq!(beep.phase(), 0.0);
        assert_eq!(beep.remaining(), 480);
    }

    #[test]
    fn test_degenerate_triggers_stay_inactive() {
        let mut beep = BeepState::new(48000);

        beep.trigger(0.0, 40);
        assert!(!beep.is_active());

        beep.trigger(-100.0, 40);
        assert!(!beep.is_active());

        beep.trigger(1200.0, -5);
        assert!(!beep.is_active());

        beep.trigger(1200.0, 0);
        assert!(!beep.is_active());
        assert_eq!(beep.advance(), 0.0);
    }

    #[test]
    fn test_degenerate_trigger_cancels_running_tone() {
        let mut beep = BeepState::new(48000);
        beep.trigger(1200.0, 40);
        beep.trigger(1200.0, 0);
        assert!(!beep.is_active());
    }

    #[test]
    fn test_shared_overlay_clones_see_trigger() {
        let overlay = BeepOverlay::new(48000);
        let handle = overlay.clone();

        handle.trigger(800.0, 30);
        assert!(overlay.is_active());
        assert_eq!(overlay.snapshot().remaining(), 1440);

        overlay.advance();
        assert_eq!(handle.snapshot().remaining(), 1439);
    }

    #[test]
    fn test_concurrent_trigger_never_tears() {
        let overlay = BeepOverlay::new(48000);
        let trigger = overlay.clone();

        let writer = std::thread::spawn(move || {
            for i in 0..2000 {
                if i % 2 == 0 {
                    trigger.trigger(1200.0, 40);
                } else {
                    trigger.trigger(500.0, 10);
                }
            }
        });

        for _ in 0..2000 {
            let mut state = overlay.lock();
            state.advance();
            // Countdown always belongs to the frequency it was armed with
            if state.is_active() {
                let limit = if state.frequency() == 1200.0 { 1920 } else { 480 };
                assert!(state.remaining() < limit);
            }
        }

        writer.join().unwrap();
    }
}
