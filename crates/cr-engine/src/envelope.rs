//! Envelope scheduling on gain parameters.
//!
//! Two shapes are used by the composition: the attack/decay envelope of a
//! pluck, and the smoothed step that moves a continuous bed (drone, rain,
//! master) toward a new level.

use cr_ir::{AudioTime, AutomationError, ParamTimeline};

/// Attack/decay shape of a plucked note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PluckEnvelope {
    /// Gain reached at the end of the attack
    pub peak: f32,
    /// Attack length in seconds
    pub attack: f64,
    /// Value the decay arrives at. Must be positive: an exponential decay
    /// cannot reach zero.
    pub floor: f32,
}

impl PluckEnvelope {
    pub const DEFAULT: PluckEnvelope = PluckEnvelope { peak: 0.18, attack: 0.02, floor: 0.0001 };

    /// Schedule the envelope for a note at `onset` lasting `length` seconds.
    ///
    /// The gain holds at 0 until `onset`, rises linearly to `peak` over
    /// `attack`, then decays exponentially to `floor` at `onset + length`.
    pub fn schedule(
        &self,
        param: &mut ParamTimeline,
        onset: AudioTime,
        length: f64,
    ) -> Result<(), AutomationError> {
        param.set_value_at(onset, 0.0)?;
        param.linear_ramp_to(self.peak, onset + self.attack)?;
        param.exponential_ramp_to(self.floor, onset + length.max(self.attack))
    }
}

impl Default for PluckEnvelope {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Move `param` toward `target` from `start`, with time constant `tau`.
pub fn approach(
    param: &mut ParamTimeline,
    start: AudioTime,
    target: f32,
    tau: f64,
) -> Result<(), AutomationError> {
    param.set_target_at(target, start, tau)
}
