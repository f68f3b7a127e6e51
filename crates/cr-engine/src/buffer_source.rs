//! Playback cursor over a sample buffer.

/// Reads a buffer one frame at a time, optionally wrapping at the end.
#[derive(Clone, Debug, Default)]
pub struct BufferPlayer {
    position: usize,
    looped: bool,
    finished: bool,
}

impl BufferPlayer {
    pub fn new(looped: bool) -> Self {
        Self { position: 0, looped, finished: false }
    }

    /// Whether a one-shot player has run off the end of its buffer.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Read the next sample from `data`.
    pub fn next_sample(&mut self, data: &[f32]) -> f32 {
        if self.finished {
            return 0.0;
        }
        let Some(&value) = data.get(self.position) else {
            self.finished = true;
            return 0.0;
        };
        self.position += 1;
        if self.position >= data.len() {
            if self.looped {
                self.position = 0;
            } else {
                self.finished = true;
            }
        }
        value
    }
}
