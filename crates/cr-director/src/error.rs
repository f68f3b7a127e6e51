//! Director error type.

use cr_audio::AudioError;
use cr_engine::EngineError;
use thiserror::Error;

/// Errors surfaced by [`crate::Director::start`] and offline rendering.
#[derive(Debug, Error)]
pub enum DirectorError {
    /// No usable audio output on this host.
    #[error("audio output unavailable: {0}")]
    Unavailable(#[from] AudioError),
    #[error("failed to spawn render thread: {0}")]
    RenderThread(#[source] std::io::Error),
    #[error("render thread exited before the session was armed")]
    RenderThreadLost,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl DirectorError {
    /// Whether the failure means the host cannot play audio at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DirectorError::Unavailable(_))
    }
}
