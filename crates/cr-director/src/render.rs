//! Offline rendering of the whole composition.

use cr_engine::{Frame, RenderContext};

use crate::error::DirectorError;
use crate::session;
use crate::wav;

/// Silence appended after the session end.
pub const TAIL_SECONDS: f64 = 0.25;

/// Render one session from a fresh context, up to its end plus a short
/// silent tail.
pub fn render_composition(sample_rate: u32) -> Result<Vec<Frame>, DirectorError> {
    let mut ctx = RenderContext::new(sample_rate);
    let armed = session::arm(&mut ctx)?;

    let total = armed.end.to_frame(sample_rate) as usize;
    let tail = (TAIL_SECONDS * sample_rate as f64) as usize;
    let mut frames = Vec::with_capacity(total + tail);
    frames.resize(total, Frame::silence());
    ctx.render_into(&mut frames);

    session::release(&mut ctx, &armed.graph);
    frames.resize(total + tail, Frame::silence());
    tracing::debug!(frames = frames.len(), sample_rate, "offline render complete");
    Ok(frames)
}

pub fn render_to_wav(sample_rate: u32) -> Result<Vec<u8>, DirectorError> {
    let frames = render_composition(sample_rate)?;
    Ok(wav::frames_to_wav(&frames, sample_rate))
}
