//! Scheduled events of a playback session.

use crate::audio_time::AudioTime;
use crate::automation::Ramp;

/// One entry of a session's schedule.
///
/// Events are produced in a single pass when a session is armed and are
/// never mutated afterwards. Their times are on the audio clock, relative
/// to the reference instant captured at arming.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledEvent {
    /// When the event takes effect
    pub time: AudioTime,
    /// What the event does
    pub kind: EventKind,
}

impl ScheduledEvent {
    /// Create a new event.
    pub fn new(time: AudioTime, kind: EventKind) -> Self {
        Self { time, kind }
    }
}

/// The kinds of event a session schedules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventKind {
    /// A single enveloped tone burst.
    Pluck(Pluck),
    /// Start one of the continuous drone voices.
    DroneStart(Drone),
    /// An automation step on one of the session's long-lived gain stages.
    GainRamp { stage: Stage, ramp: Ramp },
}

/// Parameters of a pluck burst.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pluck {
    /// Pitch in Hz
    pub frequency: f32,
    /// Seconds from onset until the decay reaches its floor
    pub length: f64,
}

/// A continuous drone voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drone {
    /// Index of the voice in the session's drone bank
    pub voice: u8,
    /// Pitch in Hz
    pub frequency: f32,
    /// Fixed output gain
    pub gain: f32,
}

/// Long-lived gain stages that receive ramps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Master,
    Rain,
}

impl EventKind {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Pluck(_) => "pluck",
            EventKind::DroneStart(_) => "drone-start",
            EventKind::GainRamp { .. } => "gain-ramp",
        }
    }
}
