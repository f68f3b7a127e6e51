//! Automation curves for gain parameters.
//!
//! A `ParamTimeline` is a short, time-ordered list of automation events
//! with the semantics of a hardware-clocked audio parameter: events at or
//! before the evaluation time have taken effect, a ramp ending after it
//! is interpolated from the value held at the previous event, and a
//! `Target` event approaches its goal exponentially with no end time.

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::audio_time::AudioTime;

/// Maximum events per parameter. A pluck needs three, the master and
/// rain stages need two and three.
pub const MAX_AUTOMATION_EVENTS: usize = 8;

/// How a parameter moves to a value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ramp {
    /// Jump to the value at the event time.
    SetValue(f32),
    /// Straight line from the previous event, arriving at the event time.
    Linear(f32),
    /// Geometric curve from the previous event, arriving at the event
    /// time. The value must be non-zero.
    Exponential(f32),
    /// From the event time on, approach `target` exponentially with the
    /// given time constant in seconds.
    Target { target: f32, time_constant: f64 },
}

/// A ramp placed on the audio clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutomationEvent {
    pub time: AudioTime,
    pub ramp: Ramp,
}

/// Reasons an automation event is rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum AutomationError {
    #[error("automation timeline already holds {MAX_AUTOMATION_EVENTS} events")]
    Full,
    #[error("invalid automation value {0}")]
    InvalidValue(f32),
    #[error("time constant must be positive and finite, got {0}")]
    InvalidTimeConstant(f64),
    #[error("invalid automation time {0}")]
    InvalidTime(f64),
}

/// Automation state of one parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamTimeline {
    /// Value before any event takes effect.
    intrinsic: f32,
    events: ArrayVec<AutomationEvent, MAX_AUTOMATION_EVENTS>,
}

impl ParamTimeline {
    /// Create a timeline with an intrinsic value and no events.
    pub fn new(intrinsic: f32) -> Self {
        Self { intrinsic, events: ArrayVec::new() }
    }

    /// The value used before the first event.
    pub fn intrinsic(&self) -> f32 {
        self.intrinsic
    }

    /// Scheduled events in time order.
    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Insert an event. Events sharing a time keep insertion order.
    pub fn schedule(&mut self, time: AudioTime, ramp: Ramp) -> Result<(), AutomationError> {
        if !time.is_valid() {
            return Err(AutomationError::InvalidTime(time.secs()));
        }
        validate(ramp)?;
        if self.events.is_full() {
            return Err(AutomationError::Full);
        }
        let pos = self.events.partition_point(|e| e.time.secs() <= time.secs());
        self.events.insert(pos, AutomationEvent { time, ramp });
        Ok(())
    }

    pub fn set_value_at(&mut self, time: AudioTime, value: f32) -> Result<(), AutomationError> {
        self.schedule(time, Ramp::SetValue(value))
    }

    pub fn linear_ramp_to(&mut self, value: f32, end: AudioTime) -> Result<(), AutomationError> {
        self.schedule(end, Ramp::Linear(value))
    }

    pub fn exponential_ramp_to(&mut self, value: f32, end: AudioTime) -> Result<(), AutomationError> {
        self.schedule(end, Ramp::Exponential(value))
    }

    pub fn set_target_at(
        &mut self,
        target: f32,
        start: AudioTime,
        time_constant: f64,
    ) -> Result<(), AutomationError> {
        self.schedule(start, Ramp::Target { target, time_constant })
    }

    /// Evaluate the parameter at `time`.
    pub fn value_at(&self, time: AudioTime) -> f32 {
        let t = time.secs().max(0.0);
        // Value held at `anchor`, the time of the last applied event.
        let mut held = self.intrinsic;
        let mut anchor = 0.0;
        let mut approach: Option<(f32, f64)> = None;

        for event in &self.events {
            let at = event.time.secs();
            if at > t {
                let frac = (t - anchor) / (at - anchor);
                return match event.ramp {
                    Ramp::Linear(end) => held + (end - held) * frac as f32,
                    Ramp::Exponential(end) => exponential(held, end, frac),
                    Ramp::SetValue(_) | Ramp::Target { .. } => settle(held, approach, t - anchor),
                };
            }

            let before = settle(held, approach, at - anchor);
            match event.ramp {
                Ramp::SetValue(v) | Ramp::Linear(v) | Ramp::Exponential(v) => {
                    held = v;
                    approach = None;
                }
                Ramp::Target { target, time_constant } => {
                    held = before;
                    approach = Some((target, time_constant));
                }
            }
            anchor = at;
        }

        settle(held, approach, t - anchor)
    }
}

fn validate(ramp: Ramp) -> Result<(), AutomationError> {
    match ramp {
        Ramp::SetValue(v) | Ramp::Linear(v) if !v.is_finite() => Err(AutomationError::InvalidValue(v)),
        Ramp::Exponential(v) if !v.is_finite() || v == 0.0 => Err(AutomationError::InvalidValue(v)),
        Ramp::Target { target, .. } if !target.is_finite() => Err(AutomationError::InvalidValue(target)),
        Ramp::Target { time_constant, .. } if !(time_constant > 0.0) || !time_constant.is_finite() => {
            Err(AutomationError::InvalidTimeConstant(time_constant))
        }
        _ => Ok(()),
    }
}

/// Value `dt` seconds into an active `Target` approach, or `held` if none.
fn settle(held: f32, approach: Option<(f32, f64)>, dt: f64) -> f32 {
    match approach {
        Some((target, tau)) => {
            let k = libm::exp(-dt / tau) as f32;
            target + (held - target) * k
        }
        None => held,
    }
}

/// Geometric interpolation; holds `from` when the curve is undefined.
fn exponential(from: f32, to: f32, frac: f64) -> f32 {
    if from == 0.0 || (from < 0.0) != (to < 0.0) {
        return from;
    }
    let ratio = (to / from) as f64;
    (from as f64 * libm::pow(ratio, frac)) as f32
}
