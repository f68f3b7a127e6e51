//! Audio frame type.

/// A stereo audio frame with samples nominally in `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: f32) -> Self {
        Self { left: value, right: value }
    }

    /// Whether both channels are exactly zero.
    pub fn is_silent(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }

    /// Largest absolute sample of the two channels.
    pub fn peak(&self) -> f32 {
        self.left.abs().max(self.right.abs())
    }

    /// Convert to 16-bit PCM, clamping out-of-range samples.
    pub fn to_pcm16(self) -> (i16, i16) {
        (pcm16(self.left), pcm16(self.right))
    }
}

fn pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}
