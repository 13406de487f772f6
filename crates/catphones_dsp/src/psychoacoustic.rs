//! Psychoacoustic Enhancement Processor
//!
//! Per-sample stereo transform that makes small speakers sound louder and
//! fuller. Stages run in a fixed order, each feeding the next:
//!
//! 1. Drive measurement: louder of left/right, before any processing
//! 2. Envelope follower in dB with asymmetric attack/release
//! 3. Compressor gain from the envelope (unity below threshold)
//! 4. Bass boost: single-pole low-pass per channel mixed back onto the input
//! 5. Compressor gain applied
//! 6. Presence gain, then master gain (broadband multiplies)
//! 7. Soft clip at 0.95
//!
//! Presence is a broadband scalar and bass a single-pole shelf, not a
//! parametric EQ. The device presets are tuned against these exact curves.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::DspError;
use crate::processor::StereoProcessor;
use crate::soft_clip::SoftClipper;

/// Cutoff of the bass-detection low-pass (Hz)
pub const BASS_CUTOFF_HZ: f32 = 100.0;

/// Envelope blend coefficient while the level is rising
pub const ATTACK_COEFF: f32 = 0.1;

/// Envelope blend coefficient while the level is falling
pub const RELEASE_COEFF: f32 = 0.05;

/// Linear floor before converting to dB (-120 dB)
const LEVEL_FLOOR: f32 = 1e-6;

/// Share of the boosted low band mixed back onto the dry signal
const BASS_MIX: f32 = 0.5;

/// Processor configuration
///
/// Gains are linear multipliers (1.0 = unity), the threshold is in dB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessorSettings {
    pub compressor_threshold_db: f32,
    pub compressor_ratio: f32,
    pub bass_boost: f32,
    pub presence: f32,
    pub master_gain: f32,
    pub enabled: bool,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            compressor_threshold_db: -14.0,
            compressor_ratio: 5.0,
            bass_boost: 2.7,
            presence: 2.2,
            master_gain: 2.0,
            enabled: true,
        }
    }
}

impl ProcessorSettings {
    /// Apply the same clamps the individual setters use
    pub fn sanitized(self) -> Self {
        Self {
            compressor_threshold_db: self.compressor_threshold_db,
            compressor_ratio: self.compressor_ratio.max(1.0),
            bass_boost: self.bass_boost.max(0.0),
            presence: self.presence.max(0.0),
            master_gain: self.master_gain.max(0.0),
            enabled: self.enabled,
        }
    }
}

/// Single-pole low-pass coefficient for `cutoff_hz` at `sample_rate`
///
/// `alpha = w / (w + 1)` with `w = 2π·fc/fs`.
#[inline]
pub fn lowpass_coefficient(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let w = 2.0 * PI * cutoff_hz / sample_rate;
    w / (w + 1.0)
}

#[inline]
fn linear_to_db(linear: f32) -> f32 {
    20.0 * linear.max(LEVEL_FLOOR).log10()
}

#[inline]
fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// The psychoacoustic processor
///
/// Owns the per-channel bass filter state and the shared compressor
/// envelope. Designed for real-time use: no allocations in
/// `process_stereo()`.
#[derive(Debug, Clone)]
pub struct PsychoacousticProcessor {
    settings: ProcessorSettings,
    sample_rate: f32,
    lpf_alpha: f32,
    clipper: SoftClipper,
    /// Previous low-pass output, left channel
    prev_left: f32,
    /// Previous low-pass output, right channel
    prev_right: f32,
    /// Smoothed loudness estimate (dB)
    envelope_db: f32,
}

impl PsychoacousticProcessor {
    /// Create a processor with the compiled-in default settings
    pub fn new(sample_rate: f32) -> Result<Self, DspError> {
        Self::with_settings(sample_rate, ProcessorSettings::default())
    }

    /// Create a processor with explicit settings (clamped like the setters)
    pub fn with_settings(sample_rate: f32, settings: ProcessorSettings) -> Result<Self, DspError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }

        Ok(Self {
            settings: settings.sanitized(),
            sample_rate,
            lpf_alpha: lowpass_coefficient(BASS_CUTOFF_HZ, sample_rate),
            clipper: SoftClipper::default(),
            prev_left: 0.0,
            prev_right: 0.0,
            envelope_db: 0.0,
        })
    }

    /// Process a stereo sample pair
    ///
    /// Inputs are nominally in [-1.0, 1.0]; larger values are tolerated and
    /// end up saturated by the soft clipper. When disabled the inputs are
    /// returned as-is and no state is touched.
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls, O(1) time.
    #[inline]
    pub fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        if !self.settings.enabled {
            return (left, right);
        }

        let drive = if left.abs() > right.abs() { left } else { right };
        let gain = self.follow_envelope(drive);

        let bass_left = Self::bass_boost(
            left,
            &mut self.prev_left,
            self.lpf_alpha,
            self.settings.bass_boost,
        );
        let bass_right = Self::bass_boost(
            right,
            &mut self.prev_right,
            self.lpf_alpha,
            self.settings.bass_boost,
        );

        let out_left = bass_left * gain * self.settings.presence * self.settings.master_gain;
        let out_right = bass_right * gain * self.settings.presence * self.settings.master_gain;

        (
            self.clipper.process_sample(out_left),
            self.clipper.process_sample(out_right),
        )
    }

    /// Advance the envelope with `drive` and return the linear compressor gain
    #[inline]
    fn follow_envelope(&mut self, drive: f32) -> f32 {
        let level_db = linear_to_db(drive.abs() + LEVEL_FLOOR);

        let coeff = if level_db > self.envelope_db {
            ATTACK_COEFF
        } else {
            RELEASE_COEFF
        };
        self.envelope_db = self.envelope_db * (1.0 - coeff) + level_db * coeff;

        if self.envelope_db > self.settings.compressor_threshold_db {
            db_to_linear(self.gain_reduction_db())
        } else {
            1.0
        }
    }

    /// One channel of the bass shelf; updates that channel's filter state
    #[inline]
    fn bass_boost(sample: f32, prev: &mut f32, alpha: f32, boost: f32) -> f32 {
        let filtered = *prev * (1.0 - alpha) + sample * alpha;
        *prev = filtered;

        sample + filtered * (boost - 1.0) * BASS_MIX
    }

    /// Gain reduction implied by the current envelope (dB, ≤ 0.0)
    ///
    /// Exactly 0.0 while the envelope is at or below the threshold.
    pub fn gain_reduction_db(&self) -> f32 {
        let threshold = self.settings.compressor_threshold_db;
        if self.envelope_db > threshold {
            (self.envelope_db - threshold) / self.settings.compressor_ratio + threshold
                - self.envelope_db
        } else {
            0.0
        }
    }

    /// Set bass boost amount (0.0 = cut, 1.0 = neutral, >1.0 = boost)
    pub fn set_bass_boost(&mut self, boost: f32) {
        self.settings.bass_boost = boost.max(0.0);
    }

    /// Set presence amount (0.0 = mute, 1.0 = neutral, >1.0 = boost)
    pub fn set_presence(&mut self, presence: f32) {
        self.settings.presence = presence.max(0.0);
    }

    /// Set master output gain (>1.0 = louder, <1.0 = quieter)
    pub fn set_master_gain(&mut self, gain: f32) {
        self.settings.master_gain = gain.max(0.0);
    }

    /// Set compressor threshold in dB (any value, including positive)
    pub fn set_compressor_threshold(&mut self, db: f32) {
        self.settings.compressor_threshold_db = db;
    }

    /// Set compressor ratio (values below 1.0 are raised to 1.0)
    pub fn set_compressor_ratio(&mut self, ratio: f32) {
        self.settings.compressor_ratio = ratio.max(1.0);
    }

    /// Enable or bypass the enhancement
    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    /// Replace all settings at once (clamped like the setters)
    pub fn apply_settings(&mut self, settings: ProcessorSettings) {
        self.settings = settings.sanitized();
    }

    /// Current configuration
    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Bass low-pass coefficient derived from the sample rate
    pub fn lowpass_alpha(&self) -> f32 {
        self.lpf_alpha
    }

    /// Current envelope estimate in dB
    pub fn envelope_db(&self) -> f32 {
        self.envelope_db
    }

    /// Current bass filter state as `(left, right)`
    pub fn filter_state(&self) -> (f32, f32) {
        (self.prev_left, self.prev_right)
    }

    /// Clear the filter and envelope state; settings are kept
    pub fn reset(&mut self) {
        self.prev_left = 0.0;
        self.prev_right = 0.0;
        self.envelope_db = 0.0;
    }
}

impl StereoProcessor for PsychoacousticProcessor {
    #[inline]
    fn process_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.process_stereo(left, right)
    }

    fn reset(&mut self) {
        PsychoacousticProcessor::reset(self);
    }

    fn name(&self) -> &'static str {
        "Psychoacoustic Enhancer"
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Nothing is reduced while bypassed
    fn gain_reduction_db(&self) -> f32 {
        if self.settings.enabled {
            PsychoacousticProcessor::gain_reduction_db(self)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> PsychoacousticProcessor {
        PsychoacousticProcessor::new(48000.0).unwrap()
    }

    /// Unity settings with a threshold the envelope can never reach
    fn neutral() -> ProcessorSettings {
        ProcessorSettings {
            compressor_threshold_db: 60.0,
            compressor_ratio: 1.0,
            bass_boost: 1.0,
            presence: 1.0,
            master_gain: 1.0,
            enabled: true,
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = ProcessorSettings::default();
        assert_eq!(settings.compressor_threshold_db, -14.0);
        assert_eq!(settings.compressor_ratio, 5.0);
        assert_eq!(settings.bass_boost, 2.7);
        assert_eq!(settings.presence, 2.2);
        assert_eq!(settings.master_gain, 2.0);
        assert!(settings.enabled);
    }

    #[test]
    fn test_invalid_sample_rate() {
        assert!(PsychoacousticProcessor::new(0.0).is_err());
        assert!(PsychoacousticProcessor::new(-48000.0).is_err());
        assert!(PsychoacousticProcessor::new(f32::NAN).is_err());
    }

    #[test]
    fn test_lowpass_coefficient() {
        let p = processor();
        let w = 2.0 * PI * 100.0 / 48000.0;
        assert!((p.lowpass_alpha() - w / (w + 1.0)).abs() < 1e-7);
        // ~0.013 at 48 kHz
        assert!(p.lowpass_alpha() > 0.012 && p.lowpass_alpha() < 0.014);
    }

    #[test]
    fn test_disabled_passthrough_leaves_state() {
        let mut p = processor();
        for _ in 0..64 {
            p.process_stereo(0.8, -0.3);
        }
        let envelope = p.envelope_db();
        let filters = p.filter_state();

        p.set_enabled(false);
        for (l, r) in [(0.5, -0.5), (1.0, 1.0), (-3.0, 2.0), (0.0, 0.0)] {
            assert_eq!(p.process_stereo(l, r), (l, r));
        }

        assert_eq!(p.envelope_db(), envelope);
        assert_eq!(p.filter_state(), filters);
        assert!(!p.is_enabled());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut p = processor();
        for i in 0..100 {
            let x = (i as f32 * 0.1).sin();
            p.process_stereo(x, -x);
        }

        p.reset();
        let once = (p.envelope_db(), p.filter_state(), *p.settings());
        p.reset();
        let twice = (p.envelope_db(), p.filter_state(), *p.settings());

        assert_eq!(once, twice);
        assert_eq!(p.envelope_db(), 0.0);
        assert_eq!(p.filter_state(), (0.0, 0.0));
    }

    #[test]
    fn test_reset_keeps_settings() {
        let mut p = processor();
        p.set_master_gain(1.3);
        p.reset();
        assert_eq!(p.settings().master_gain, 1.3);
    }

    #[test]
    fn test_setter_clamping() {
        let mut p = processor();

        p.set_bass_boost(-1.0);
        p.set_presence(-2.0);
        p.set_master_gain(-0.5);
        p.set_compressor_ratio(0.25);
        p.set_compressor_threshold(-80.0);

        let s = p.settings();
        assert_eq!(s.bass_boost, 0.0);
        assert_eq!(s.presence, 0.0);
        assert_eq!(s.master_gain, 0.0);
        assert_eq!(s.compressor_ratio, 1.0);
        assert_eq!(s.compressor_threshold_db, -80.0);

        p.set_compressor_threshold(12.0);
        assert_eq!(p.settings().compressor_threshold_db, 12.0);
    }

    #[test]
    fn test_apply_settings_sanitizes() {
        let mut p = processor();
        p.apply_settings(ProcessorSettings {
            compressor_ratio: 0.0,
            master_gain: -1.0,
            ..ProcessorSettings::default()
        });
        assert_eq!(p.settings().compressor_ratio, 1.0);
        assert_eq!(p.settings().master_gain, 0.0);
    }

    #[test]
    fn test_unity_below_threshold() {
        // Envelope starts at 0 dB and can only fall for |x| <= 1
        let mut p = PsychoacousticProcessor::with_settings(48000.0, neutral()).unwrap();

        for _ in 0..4800 {
            assert_eq!(p.process_stereo(0.0, 0.0), (0.0, 0.0));
            assert_eq!(p.gain_reduction_db(), 0.0);
        }
        assert!(p.envelope_db() < -100.0);
    }

    #[test]
    fn test_neutral_settings_are_transparent() {
        let mut p = PsychoacousticProcessor::with_settings(48000.0, neutral()).unwrap();

        for i in 0..480 {
            let x = 0.5 * (i as f32 * 0.05).sin();
            let (l, r) = p.process_stereo(x, -x);
            assert_eq!(l, x);
            assert_eq!(r, -x);
        }
    }

    #[test]
    fn test_envelope_attack_faster_than_release() {
        let mut p = processor();
        p.reset();

        // Silence pulls the envelope down at the release rate
        p.process_stereo(0.0, 0.0);
        let level = 20.0 * (1e-6_f32).log10();
        let expected = level * RELEASE_COEFF;
        assert!((p.envelope_db() - expected).abs() < 1e-3);

        // A loud sample pushes it back up at the attack rate
        let before = p.envelope_db();
        p.process_stereo(1.0, 0.0);
        let level = 20.0 * (1.0_f32 + 1e-6).log10();
        let expected = before * (1.0 - ATTACK_COEFF) + level * ATTACK_COEFF;
        assert!((p.envelope_db() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_drive_uses_louder_channel() {
        let mut a = processor();
        let mut b = processor();
        a.process_stereo(0.0, -0.9);
        b.process_stereo(-0.9, 0.0);
        assert_eq!(a.envelope_db(), b.envelope_db());
    }

    #[test]
    fn test_compression_curve() {
        let mut p = PsychoacousticProcessor::with_settings(
            48000.0,
            ProcessorSettings {
                compressor_threshold_db: -20.0,
                compressor_ratio: 4.0,
                ..neutral()
            },
        )
        .unwrap();

        // Envelope 0 dB sits 20 dB above threshold: 20/4 - 20 = -15 dB
        assert!((p.gain_reduction_db() + 15.0).abs() < 1e-5);

        p.set_compressor_ratio(1.0);
        assert_eq!(p.gain_reduction_db(), 0.0);
    }

    #[test]
    fn test_compressor_attenuates_loud_input() {
        let mut p = PsychoacousticProcessor::with_settings(
            48000.0,
            ProcessorSettings {
                compressor_threshold_db: -20.0,
                compressor_ratio: 4.0,
                ..neutral()
            },
        )
        .unwrap();

        for _ in 0..1000 {
            p.process_stereo(0.5, 0.5);
        }
        let (l, r) = p.process_stereo(0.5, 0.5);
        assert!(l < 0.5 && l > 0.0);
        assert_eq!(l, r);
    }

    #[test]
    fn test_bass_boost_first_sample() {
        let mut p = PsychoacousticProcessor::with_settings(
            48000.0,
            ProcessorSettings {
                bass_boost: 3.0,
                ..neutral()
            },
        )
        .unwrap();
        let alpha = p.lowpass_alpha();

        let (l, r) = p.process_stereo(0.5, -0.25);

        // filtered = x * alpha, out = x + 0.5 * filtered * (3 - 1)
        assert!((l - (0.5 + 0.5 * alpha)).abs() < 1e-6);
        assert!((r - (-0.25 - 0.25 * alpha)).abs() < 1e-6);
        assert!((p.filter_state().0 - 0.5 * alpha).abs() < 1e-7);
    }

    #[test]
    fn test_bass_boost_raises_dc_level() {
        let mut p = PsychoacousticProcessor::with_settings(
            48000.0,
            ProcessorSettings {
                bass_boost: 2.0,
                ..neutral()
            },
        )
        .unwrap();

        let mut out = 0.0;
        for _ in 0..20_000 {
            out = p.process_stereo(0.2, 0.2).0;
        }
        // Low-pass settles on the input: 0.2 + 0.5 * 0.2 * (2 - 1)
        assert!((out - 0.3).abs() < 1e-3);
    }

    #[test]
    fn test_presence_and_master_multiply() {
        let mut p = PsychoacousticProcessor::with_settings(
            48000.0,
            ProcessorSettings {
                presence: 1.5,
                master_gain: 0.5,
                ..neutral()
            },
        )
        .unwrap();

        let (l, r) = p.process_stereo(0.4, -0.2);
        assert!((l - 0.3).abs() < 1e-6);
        assert!((r + 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_output_bounded() {
        let mut p = PsychoacousticProcessor::with_settings(
            48000.0,
            ProcessorSettings {
                compressor_threshold_db: 0.0,
                compressor_ratio: 1.0,
                bass_boost: 10.0,
                presence: 8.0,
                master_gain: 8.0,
                enabled: true,
            },
        )
        .unwrap();

        for i in 0..10_000 {
            let x = (i as f32 * 0.013).sin();
            let y = if i % 7 == 0 { 1.0 } else { -(i as f32 * 0.021).cos() };
            let (l, r) = p.process_stereo(x, y);
            assert!(l.abs() <= 1.0, "left {} out of range", l);
            assert!(r.abs() <= 1.0, "right {} out of range", r);
        }
    }

    #[test]
    fn test_defaults_bounded_at_full_scale() {
        let mut p = processor();
        for i in 0..10_000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let (l, r) = p.process_stereo(x, x);
            assert!(l.abs() <= 1.0 && r.abs() <= 1.0);
        }
    }

    #[test]
    fn test_out_of_range_input_is_finite() {
        let mut p = processor();
        let (l, r) = p.process_stereo(25.0, -25.0);
        assert!(l.is_finite() && r.is_finite());
        assert!(l <= 1.0 && r >= -1.0);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = ProcessorSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: ProcessorSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }
}
