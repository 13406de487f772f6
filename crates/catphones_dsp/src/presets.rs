//! Built-in Enhancement Presets

use crate::error::DspError;
use crate::psychoacoustic::ProcessorSettings;

/// Named processor preset
pub type Preset = (&'static str, ProcessorSettings);

/// What the headphones apply at boot
pub const SPEAKER: ProcessorSettings = ProcessorSettings {
    compressor_threshold_db: 0.5,
    compressor_ratio: 2.0,
    bass_boost: 1.9,
    presence: 1.0,
    master_gain: 2.4,
    enabled: true,
};

/// List of built-in presets
pub const PRESETS: &[Preset] = &[
    // Compiled-in processor defaults
    (
        "Default",
        ProcessorSettings {
            compressor_threshold_db: -14.0,
            compressor_ratio: 5.0,
            bass_boost: 2.7,
            presence: 2.2,
            master_gain: 2.0,
            enabled: true,
        },
    ),
    ("Speaker", SPEAKER),
    (
        "Flat",
        ProcessorSettings {
            compressor_threshold_db: 0.0,
            compressor_ratio: 1.0,
            bass_boost: 1.0,
            presence: 1.0,
            master_gain: 1.0,
            enabled: true,
        },
    ),
];

/// Look up a preset by name (case-insensitive)
pub fn preset(name: &str) -> Result<ProcessorSettings, DspError> {
    PRESETS
        .iter()
        .find(|(preset_name, _)| preset_name.eq_ignore_ascii_case(name))
        .map(|(_, settings)| *settings)
        .ok_or_else(|| DspError::UnknownPreset(name.to_string()))
}
