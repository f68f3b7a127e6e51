//! Time on the audio clock.

use core::ops::Add;

/// Position on the audio rendering clock, in seconds.
///
/// The audio clock starts at zero when a render context is created and
/// advances one frame per rendered sample. It is unrelated to the wall
/// clock that paces the presentation; the two only share the instant a
/// session was armed.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct AudioTime(f64);

/// Tolerance when mapping a time onto a frame boundary (in frames).
const FRAME_EPSILON: f64 = 1e-6;

impl AudioTime {
    /// The origin of the audio clock.
    pub const ZERO: AudioTime = AudioTime(0.0);

    /// Create a time from seconds.
    pub const fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// Time of the given frame index at `sample_rate`.
    pub fn from_frame(frame: u64, sample_rate: u32) -> Self {
        Self(frame as f64 / sample_rate as f64)
    }

    /// Seconds since the origin.
    pub const fn secs(self) -> f64 {
        self.0
    }

    /// Offset this time by `secs` seconds.
    pub fn offset(self, secs: f64) -> Self {
        Self(self.0 + secs)
    }

    /// Whether this is a usable clock position (finite and not negative).
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }

    /// First frame index whose start time is at or after this time.
    ///
    /// Times that land within a millionth of a frame of a boundary snap to
    /// that boundary, so `0.1 s` at 48 kHz is frame 4800 and not 4801.
    /// Negative times map to frame 0.
    pub fn to_frame(self, sample_rate: u32) -> u64 {
        if !(self.0 > 0.0) {
            return 0;
        }
        let exact = self.0 * sample_rate as f64;
        let nearest = libm::round(exact);
        if (exact - nearest).abs() < FRAME_EPSILON {
            nearest as u64
        } else {
            libm::ceil(exact) as u64
        }
    }
}

impl Add<f64> for AudioTime {
    type Output = AudioTime;

    fn add(self, secs: f64) -> AudioTime {
        self.offset(secs)
    }
}
