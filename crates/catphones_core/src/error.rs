//! Engine Error Types

use thiserror::Error;

/// Errors that can occur while building or controlling the chain
///
/// The sample path itself never fails; see `ProcessingChain::write`.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Chain configuration error: {0}")]
    ConfigError(String),

    #[error("DSP error: {0}")]
    DspError(#[from] catphones_dsp::DspError),

    #[error("Command queue full - audio thread isn't draining commands")]
    CommandQueueFull,

    #[error("Channel send error - receiver dropped")]
    ChannelSendError,

    #[error("No output device available")]
    NoOutputDevice,

    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    #[error("Failed to play audio stream: {0}")]
    StreamPlayError(String),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
