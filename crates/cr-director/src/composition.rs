//! The fixed composition and its event schedule.
//!
//! All times below are seconds after the session's start instant
//! `reference + LOOKAHEAD` on the audio clock, except the drones, which
//! start at `reference` itself.

use cr_ir::{AudioTime, Drone, EventKind, Pluck, Ramp, ScheduledEvent, Stage, DURATION};

/// Headroom between arming a session and its first scheduled event.
pub const LOOKAHEAD: f64 = 0.1;

/// Nominal level of the master stage.
pub const MASTER_LEVEL: f32 = 0.6;

/// The two drone voices, an octave apart.
pub const DRONES: [Drone; 2] = [
    Drone { voice: 0, frequency: 146.83, gain: 0.06 },
    Drone { voice: 1, frequency: 293.66, gain: 0.04 },
];

pub const PLUCK_COUNT: usize = 20;
pub const PLUCK_SPACING: f64 = 1.2;
pub const PLUCK_LENGTH: f64 = 0.8;
/// Onsets before this index use the intro pitch.
pub const INTRO_PLUCKS: usize = 8;
pub const INTRO_PITCH: f32 = 220.0;
pub const LOVE_PITCH: f32 = 261.63;

/// Every `FIFTH_EVERY`th onset gets a companion a fifth above.
pub const FIFTH_EVERY: usize = 4;
pub const FIFTH_RATIO: f32 = 1.5;
pub const FIFTH_LENGTH: f64 = 0.6;
/// The companion sounds this long after its onset, as a grace note.
pub const FIFTH_DELAY: f64 = 0.4;

/// Rain stage: (start, level, time constant).
pub const RAIN_SILENCE: (f64, f32, f64) = (0.0, 0.0, 0.01);
pub const RAIN_IN: (f64, f32, f64) = (19.0, 0.18, 0.6);
pub const RAIN_OUT: (f64, f32, f64) = (32.0, 0.05, 1.2);

/// Master stage: (start, level, time constant).
pub const MASTER_HOLD: (f64, f32, f64) = (0.0, MASTER_LEVEL, 0.5);
pub const MASTER_FADE: (f64, f32, f64) = (56.0, 0.15, 1.5);

/// First scheduled instant of a session armed at `reference`.
pub fn session_origin(reference: AudioTime) -> AudioTime {
    reference + LOOKAHEAD
}

/// Where the composition ends on the audio clock.
pub fn session_end(reference: AudioTime) -> AudioTime {
    session_origin(reference) + DURATION
}

/// Onset of pluck `index`.
pub fn pluck_onset(reference: AudioTime, index: usize) -> AudioTime {
    session_origin(reference) + PLUCK_SPACING * index as f64
}

/// Onsets of the `PLUCK_COUNT` main plucks.
pub fn pluck_onsets(reference: AudioTime) -> impl Iterator<Item = AudioTime> {
    (0..PLUCK_COUNT).map(move |i| pluck_onset(reference, i))
}

/// Pitch of pluck `index`.
pub fn pluck_pitch(index: usize) -> f32 {
    if index < INTRO_PLUCKS {
        INTRO_PITCH
    } else {
        LOVE_PITCH
    }
}

fn ramp(origin: AudioTime, stage: Stage, (at, target, time_constant): (f64, f32, f64)) -> ScheduledEvent {
    ScheduledEvent::new(
        origin + at,
        EventKind::GainRamp { stage, ramp: Ramp::Target { target, time_constant } },
    )
}

/// The full schedule of a session armed at `reference`, in time order.
pub fn schedule(reference: AudioTime) -> Vec<ScheduledEvent> {
    let origin = session_origin(reference);
    let mut events = Vec::with_capacity(DRONES.len() + PLUCK_COUNT * 2 + 5);

    for drone in DRONES {
        events.push(ScheduledEvent::new(reference, EventKind::DroneStart(drone)));
    }

    for i in 0..PLUCK_COUNT {
        let onset = pluck_onset(reference, i);
        let pitch = pluck_pitch(i);
        events.push(ScheduledEvent::new(
            onset,
            EventKind::Pluck(Pluck { frequency: pitch, length: PLUCK_LENGTH }),
        ));
        if i % FIFTH_EVERY == 0 {
            events.push(ScheduledEvent::new(
                onset + FIFTH_DELAY,
                EventKind::Pluck(Pluck { frequency: pitch * FIFTH_RATIO, length: FIFTH_LENGTH }),
            ));
        }
    }

    events.push(ramp(origin, Stage::Rain, RAIN_SILENCE));
    events.push(ramp(origin, Stage::Rain, RAIN_IN));
    events.push(ramp(origin, Stage::Rain, RAIN_OUT));
    events.push(ramp(origin, Stage::Master, MASTER_HOLD));
    events.push(ramp(origin, Stage::Master, MASTER_FADE));

    // Stable: equal times keep construction order.
    events.sort_by(|a, b| a.time.secs().total_cmp(&b.time.secs()));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use cr_ir::segment_at;

    fn plucks(events: &[ScheduledEvent]) -> Vec<(f64, Pluck)> {
        events
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::Pluck(p) => Some((e.time.secs(), p)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn onsets_follow_closed_form() {
        let r = AudioTime::from_secs(3.25);
        let onsets: Vec<f64> = pluck_onsets(r).map(AudioTime::secs).collect();
        assert_eq!(onsets.len(), 20);
        for (i, t) in onsets.iter().enumerate() {
            let expected = 3.25 + 0.1 + 1.2 * i as f64;
            assert!((t - expected).abs() < 1e-9, "onset {i}: {t} vs {expected}");
        }
        assert!((onsets[0] - 3.35).abs() < 1e-9);
        assert!((onsets[19] - (3.25 + 22.9)).abs() < 1e-9);
    }

    #[test]
    fn pitch_classes_split_at_intro() {
        assert!((0..8).all(|i| pluck_pitch(i) == 220.0));
        assert!((8..20).all(|i| pluck_pitch(i) == 261.63));
    }

    #[test]
    fn every_fourth_onset_has_a_fifth() {
        let events = schedule(AudioTime::ZERO);
        let all = plucks(&events);
        assert_eq!(all.len(), 25);

        let fifths: Vec<&(f64, Pluck)> = all.iter().filter(|(_, p)| p.length == FIFTH_LENGTH).collect();
        assert_eq!(fifths.len(), 5);
        for (k, (t, p)) in fifths.iter().enumerate() {
            let i = k * 4;
            let onset = pluck_onset(AudioTime::ZERO, i).secs();
            assert!((t - (onset + FIFTH_DELAY)).abs() < 1e-9);
            assert_eq!(p.frequency, pluck_pitch(i) * 1.5);
        }
    }

    #[test]
    fn schedule_is_time_ordered() {
        let events = schedule(AudioTime::from_secs(1.0));
        assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(events.len(), 2 + 25 + 5);
        // Drones start at the reference itself, ahead of everything else.
        assert!(matches!(events[0].kind, EventKind::DroneStart(_)));
        assert!(matches!(events[1].kind, EventKind::DroneStart(_)));
        assert_eq!(events[0].time, AudioTime::from_secs(1.0));
    }

    #[test]
    fn rain_follows_segment_boundaries() {
        assert_eq!(segment_at(RAIN_IN.0).id, "conflict");
        assert_eq!(segment_at(RAIN_IN.0 - 0.01).id, "love");
        assert_eq!(segment_at(RAIN_OUT.0).id, "outro");
    }

    #[test]
    fn ramps_target_the_right_stages() {
        let events = schedule(AudioTime::ZERO);
        let stages: Vec<(Stage, f64)> = events
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::GainRamp { stage, .. } => Some((stage, e.time.secs())),
                _ => None,
            })
            .collect();
        assert_eq!(stages.iter().filter(|(s, _)| *s == Stage::Rain).count(), 3);
        assert_eq!(stages.iter().filter(|(s, _)| *s == Stage::Master).count(), 2);
        assert!(stages.iter().any(|&(s, t)| s == Stage::Master && (t - 56.1).abs() < 1e-9));
    }

    #[test]
    fn session_end_is_a_minute_after_origin() {
        let r = AudioTime::from_secs(2.0);
        assert!((session_end(r).secs() - 62.1).abs() < 1e-9);
    }
}
