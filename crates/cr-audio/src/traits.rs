//! Audio output traits and error types.

use cr_engine::Frame;
use thiserror::Error;

/// Error type for audio operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
}

/// Output stream settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    /// Ring buffer length between the render thread and the device.
    pub buffer_ms: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { buffer_ms: 100 }
    }
}

/// A physical (or simulated) output the render thread writes into.
pub trait AudioOutput {
    /// Get the sample rate.
    fn sample_rate(&self) -> u32;

    /// Write frames to the output. Blocks until every frame is accepted;
    /// this back-pressure is what paces the audio clock.
    fn write(&mut self, frames: &[Frame]) -> Result<(), AudioError>;

    /// Start playback.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Stop playback.
    fn stop(&mut self) -> Result<(), AudioError>;
}

/// Opens outputs. The host is shared with the render thread, which opens
/// and owns its output for the lifetime of one session.
pub trait AudioHost: Send + Sync {
    fn open(&self, config: &OutputConfig) -> Result<Box<dyn AudioOutput>, AudioError>;
}
