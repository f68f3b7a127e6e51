//! Integration test: director start/stop against a headless host.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cr_director::{
    ClockState, Cue, Director, DirectorConfig, ManualClock, Narrator, NullHost, PlaybackClock,
};

const SR: u32 = 8_000;

fn director(host: &NullHost) -> Director {
    Director::new(Arc::new(host.clone()))
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let begin = Instant::now();
    while begin.elapsed() < timeout {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[derive(Default)]
struct Recorder {
    heard: Mutex<Vec<&'static str>>,
}

impl Narrator for Recorder {
    fn speak(&self, cue: &Cue) {
        self.heard.lock().unwrap().push(cue.text);
    }
}

#[test]
fn start_then_stop_releases_everything() {
    let host = NullHost::paced(SR);
    let mut director = director(&host);

    let session = director.start().unwrap();
    assert_eq!(session.sample_rate, SR);
    assert_eq!(session.scheduled.failed, 0);
    assert!(director.is_playing());
    assert_eq!(host.open_outputs(), 1);

    director.stop();
    assert!(!director.is_playing());
    assert!(!director.is_finished());
    assert_eq!(host.open_outputs(), 0);
    assert!(director.audio_time().is_none());
}

#[test]
fn stop_is_idempotent() {
    let host = NullHost::paced(SR);
    let mut director = director(&host);
    director.stop();
    director.start().unwrap();
    director.stop();
    director.stop();
    assert_eq!(host.open_outputs(), 0);
}

#[test]
fn restart_builds_a_fresh_session() {
    let host = NullHost::paced(SR);
    let mut director = director(&host);
    director.start().unwrap();
    director.stop();
    let second = director.start().unwrap();
    assert_eq!(second.reference.secs(), 0.0);
    assert_eq!(host.opened_total(), 2);
    assert_eq!(host.open_outputs(), 1);
}

#[test]
fn double_start_replaces_the_session() {
    let host = NullHost::paced(SR);
    let mut director = director(&host);
    let first = director.start().unwrap();
    let second = director.start().unwrap();
    assert!(second.started_at >= first.started_at);
    assert_eq!(host.opened_total(), 2);
    assert_eq!(host.open_outputs(), 1);
    drop(director);
    assert_eq!(host.open_outputs(), 0);
}

#[test]
fn unavailable_output_is_reported() {
    let host = NullHost::unavailable();
    let mut director = director(&host);
    let err = director.start().unwrap_err();
    assert!(err.is_unavailable(), "{err}");
    assert!(!director.is_playing());
    director.stop();
}

#[test]
fn audio_clock_advances_while_playing() {
    let host = NullHost::paced(SR);
    let mut director = director(&host);
    director.start().unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        director.audio_time().is_some_and(|t| t.secs() > 0.2)
    }));
    director.stop();
}

#[test]
fn natural_completion_tears_down() {
    let host = NullHost::unpaced(SR);
    let mut director = director(&host);
    director.start().unwrap();

    assert!(wait_until(Duration::from_secs(60), || director.is_finished()));
    assert!(!director.is_playing());
    assert_eq!(host.open_outputs(), 0);
    let end = director.audio_time().unwrap().secs();
    assert!((end - 60.1).abs() < 1e-3, "ended at {end}");

    director.start().unwrap();
    assert!(director.is_playing());
    director.stop();
}

#[test]
fn first_cue_is_spoken_and_the_rest_cancelled() {
    let host = NullHost::paced(SR);
    let recorder = Arc::new(Recorder::default());
    let mut director = director(&host).with_narrator(recorder.clone());

    director.start().unwrap();
    assert!(wait_until(Duration::from_secs(2), || !recorder.heard.lock().unwrap().is_empty()));
    director.stop();

    std::thread::sleep(Duration::from_millis(50));
    let heard = recorder.heard.lock().unwrap();
    assert_eq!(heard.len(), 1);
    assert_eq!(heard[0], cr_ir::SEGMENTS[0].caption);
}

#[test]
fn narration_can_be_disabled() {
    let host = NullHost::paced(SR);
    let recorder = Arc::new(Recorder::default());
    let config = DirectorConfig { narration: false, ..DirectorConfig::default() };
    let mut director = director(&host).with_config(config).with_narrator(recorder.clone());

    director.start().unwrap();
    std::thread::sleep(Duration::from_millis(100));
    director.stop();
    assert!(recorder.heard.lock().unwrap().is_empty());
}

#[test]
fn caption_timeline_scenarios() {
    let wall = ManualClock::new();
    let mut clock = PlaybackClock::new(&wall);
    clock.start();

    wall.advance(Duration::from_secs_f64(8.5));
    assert_eq!(clock.tick().segment.id, "love");
    wall.advance(Duration::from_secs(11));
    assert_eq!(clock.tick().segment.id, "conflict");
    wall.advance(Duration::from_secs(41));
    let tick = clock.tick();
    assert_eq!(tick.segment.id, "outro");
    assert_eq!(tick.elapsed, 60.0);
    assert_eq!(tick.state, ClockState::Completed);
}
