//! Message Types for Thread Communication
//!
//! Commands flow from control threads (buttons, menus) -> audio thread.
//! They are drained at the start of every `ProcessingChain::write`, so a
//! change always lands on a buffer boundary.

use catphones_dsp::{ProcessorSettings, PsychoacousticProcessor};

/// Capacity of the command queue
pub const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Commands sent from control threads to the processing chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Bass boost gain (clamped to >= 0.0)
    SetBassBoost(f32),

    /// Presence gain (clamped to >= 0.0)
    SetPresence(f32),

    /// Master output gain (clamped to >= 0.0)
    SetMasterGain(f32),

    /// Compressor threshold in dB (unclamped)
    SetCompressorThreshold(f32),

    /// Compressor ratio (clamped to >= 1.0)
    SetCompressorRatio(f32),

    /// Enable/disable enhancement (bypass)
    SetEnabled(bool),

    /// Replace every setting at once
    ApplySettings(ProcessorSettings),

    /// Clear filter and envelope state
    Reset,
}

/// A processor that can be reconfigured through [`Command`]s
pub trait CommandTarget {
    fn apply(&mut self, command: Command);
}

impl CommandTarget for PsychoacousticProcessor {
    fn apply(&mut self, command: Command) {
        match command {
            Command::SetBassBoost(boost) => self.set_bass_boost(boost),
            Command::SetPresence(presence) => self.set_presence(presence),
            Command::SetMasterGain(gain) => self.set_master_gain(gain),
            Command::SetCompressorThreshold(db) => self.set_compressor_threshold(db),
            Command::SetCompressorRatio(ratio) => self.set_compressor_ratio(ratio),
            Command::SetEnabled(enabled) => self.set_enabled(enabled),
            Command::ApplySettings(settings) => self.apply_settings(settings),
            Command::Reset => self.reset(),
        }
    }
}
