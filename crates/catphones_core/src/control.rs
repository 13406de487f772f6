//! Control Surface
//!
//! [`ControlHandle`] is what button handlers and menus hold. Beeps go
//! straight into the shared beep state; processor settings travel through
//! the command queue and apply at the next buffer boundary.

use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};
use tracing::debug;

use catphones_dsp::{BeepOverlay, BeepState, ProcessorSettings, DEFAULT_BEEP_MS};

use crate::error::{EngineError, EngineResult};
use crate::message::Command;
use crate::meters::Meters;

/// Feedback tones of the headphone buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonTone {
    PlayPause,
    Previous,
    Next,
    VolumeUp,
    VolumeDown,
}

impl ButtonTone {
    /// Beep frequency in Hz
    pub fn frequency(self) -> f32 {
        match self {
            ButtonTone::PlayPause => 800.0,
            ButtonTone::Previous | ButtonTone::Next => 500.0,
            ButtonTone::VolumeUp => 1200.0,
            ButtonTone::VolumeDown => 200.0,
        }
    }
}

/// Cloneable handle for controlling a running chain from other threads
#[derive(Clone)]
pub struct ControlHandle {
    commands: Sender<Command>,
    beep: BeepOverlay,
    meters: Arc<Meters>,
}

impl ControlHandle {
    pub(crate) fn new(commands: Sender<Command>, beep: BeepOverlay, meters: Arc<Meters>) -> Self {
        Self {
            commands,
            beep,
            meters,
        }
    }

    /// Arm a beep; replaces a beep that is still playing
    pub fn trigger_beep(&self, frequency: f32, duration_ms: i32) {
        debug!(frequency, duration_ms, "Beep triggered");
        self.beep.trigger(frequency, duration_ms);
    }

    /// Play the feedback tone of a button with the default duration
    pub fn button_beep(&self, tone: ButtonTone) {
        self.trigger_beep(tone.frequency(), DEFAULT_BEEP_MS);
    }

    /// Consistent copy of the beep state
    pub fn beep_state(&self) -> BeepState {
        self.beep.snapshot()
    }

    pub fn set_bass_boost(&self, boost: f32) -> EngineResult<()> {
        self.send(Command::SetBassBoost(boost))
    }

    pub fn set_presence(&self, presence: f32) -> EngineResult<()> {
        self.send(Command::SetPresence(presence))
    }

    pub fn set_master_gain(&self, gain: f32) -> EngineResult<()> {
        self.send(Command::SetMasterGain(gain))
    }

    pub fn set_compressor_threshold(&self, db: f32) -> EngineResult<()> {
        self.send(Command::SetCompressorThreshold(db))
    }

    pub fn set_compressor_ratio(&self, ratio: f32) -> EngineResult<()> {
        self.send(Command::SetCompressorRatio(ratio))
    }

    pub fn set_enabled(&self, enabled: bool) -> EngineResult<()> {
        self.send(Command::SetEnabled(enabled))
    }

    pub fn apply_settings(&self, settings: ProcessorSettings) -> EngineResult<()> {
        self.send(Command::ApplySettings(settings))
    }

    /// Clear filter and envelope state at the next buffer
    pub fn reset(&self) -> EngineResult<()> {
        self.send(Command::Reset)
    }

    pub fn meters(&self) -> &Meters {
        &self.meters
    }

    fn send(&self, command: Command) -> EngineResult<()> {
        self.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => EngineError::CommandQueueFull,
            TrySendError::Disconnected(_) => EngineError::ChannelSendError,
        })
    }
}
