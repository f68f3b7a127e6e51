//! Wall-clock playback position for visual sync.
//!
//! The render thread owns the audio clock; this is the second clock the
//! presentation layer reads once per display frame to pick the caption.

use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use cr_ir::{segment_at, Segment, DURATION};

/// Source of monotonic instants.
pub trait WallClock {
    fn now(&self) -> Instant;
}

/// `Instant::now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: WallClock + ?Sized> WallClock for &T {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: std::cell::Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { now: std::cell::Cell::new(Instant::now()) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
    /// Reached the end of the composition on its own.
    Completed,
}

/// One sample of the playback position.
#[derive(Clone, Copy, Debug)]
pub struct Tick {
    /// Seconds since start, capped at the duration
    pub elapsed: f64,
    pub segment: &'static Segment,
    /// `elapsed / duration`, in `[0, 1]`
    pub progress: f64,
    pub state: ClockState,
}

/// Elapsed wall time since playback started, mapped onto the timeline.
#[derive(Debug)]
pub struct PlaybackClock<C = SystemClock> {
    clock: C,
    duration: f64,
    started_at: Option<Instant>,
    elapsed: f64,
    state: ClockState,
}

impl PlaybackClock<SystemClock> {
    pub fn system() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: WallClock> PlaybackClock<C> {
    pub fn new(clock: C) -> Self {
        Self::with_duration(clock, DURATION)
    }

    pub fn with_duration(clock: C, duration: f64) -> Self {
        Self { clock, duration, started_at: None, elapsed: 0.0, state: ClockState::Idle }
    }

    /// Start counting from now. Restarts if already running.
    pub fn start(&mut self) {
        let now = self.clock.now();
        self.start_at(now);
    }

    /// Start counting from `at`, e.g. the instant the audio session began.
    pub fn start_at(&mut self, at: Instant) {
        self.started_at = Some(at);
        self.elapsed = 0.0;
        self.state = ClockState::Running;
    }

    /// Sample the position. Once the duration is reached the clock moves to
    /// `Completed` and further ticks report the final position.
    pub fn tick(&mut self) -> Tick {
        if let (ClockState::Running, Some(started)) = (self.state, self.started_at) {
            let since = self.clock.now().saturating_duration_since(started).as_secs_f64();
            self.elapsed = since.min(self.duration);
            if since >= self.duration {
                self.state = ClockState::Completed;
                self.started_at = None;
            }
        }
        self.snapshot()
    }

    /// Return to idle at position zero.
    pub fn stop(&mut self) {
        self.started_at = None;
        self.elapsed = 0.0;
        self.state = ClockState::Idle;
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn wall_clock(&self) -> &C {
        &self.clock
    }

    fn snapshot(&self) -> Tick {
        let progress = if self.duration > 0.0 { self.elapsed / self.duration } else { 1.0 };
        Tick { elapsed: self.elapsed, segment: segment_at(self.elapsed), progress, state: self.state }
    }
}

/// Drive `clock` at `fps` ticks per second until it completes or `on_tick`
/// breaks. A break stops the clock. Returns the final state.
pub fn run_frames<C: WallClock>(
    clock: &mut PlaybackClock<C>,
    fps: u32,
    mut on_tick: impl FnMut(&Tick) -> ControlFlow<()>,
) -> ClockState {
    let interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
    loop {
        let tick = clock.tick();
        if on_tick(&tick).is_break() {
            clock.stop();
            break;
        }
        if tick.state != ClockState::Running {
            break;
        }
        std::thread::sleep(interval);
    }
    clock.state()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn idle_clock_reports_intro() {
        let wall = ManualClock::new();
        let mut clock = PlaybackClock::new(&wall);
        let tick = clock.tick();
        assert_eq!(tick.state, ClockState::Idle);
        assert_eq!(tick.elapsed, 0.0);
        assert_eq!(tick.segment.id, "intro");
    }

    #[test]
    fn segments_follow_elapsed_time() {
        let wall = ManualClock::new();
        let mut clock = PlaybackClock::new(&wall);
        clock.start();

        wall.advance(secs(5.0));
        assert_eq!(clock.tick().segment.id, "intro");
        wall.advance(secs(5.0));
        assert_eq!(clock.tick().segment.id, "love");
        wall.advance(secs(15.0));
        assert_eq!(clock.tick().segment.id, "conflict");
        wall.advance(secs(20.0));
        let tick = clock.tick();
        assert_eq!(tick.segment.id, "outro");
        assert!((tick.progress - 0.75).abs() < 1e-9);
    }

    #[test]
    fn completes_at_duration() {
        let wall = ManualClock::new();
        let mut clock = PlaybackClock::new(&wall);
        clock.start();
        wall.advance(secs(61.0));
        let tick = clock.tick();
        assert_eq!(tick.state, ClockState::Completed);
        assert_eq!(tick.elapsed, 60.0);
        assert_eq!(tick.progress, 1.0);
        assert_eq!(tick.segment.id, "outro");

        // Final position is held.
        wall.advance(secs(10.0));
        assert_eq!(clock.tick().elapsed, 60.0);
    }

    #[test]
    fn stop_resets_position() {
        let wall = ManualClock::new();
        let mut clock = PlaybackClock::new(&wall);
        clock.start();
        wall.advance(secs(12.0));
        clock.tick();
        clock.stop();
        assert_eq!(clock.state(), ClockState::Idle);
        assert_eq!(clock.elapsed(), 0.0);
        wall.advance(secs(3.0));
        assert_eq!(clock.tick().elapsed, 0.0);
    }

    #[test]
    fn restart_rebases() {
        let wall = ManualClock::new();
        let mut clock = PlaybackClock::new(&wall);
        clock.start();
        wall.advance(secs(30.0));
        clock.tick();
        clock.start();
        wall.advance(secs(1.0));
        assert!((clock.tick().elapsed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn run_frames_stops_on_break() {
        let wall = ManualClock::new();
        let mut clock = PlaybackClock::new(&wall);
        clock.start();
        let mut ticks = 0;
        let state = run_frames(&mut clock, 1000, |_| {
            ticks += 1;
            wall.advance(secs(1.0));
            if ticks == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });
        assert_eq!(ticks, 3);
        assert_eq!(state, ClockState::Idle);
    }

    #[test]
    fn run_frames_ends_on_completion() {
        let wall = ManualClock::new();
        let mut clock = PlaybackClock::with_duration(&wall, 2.0);
        clock.start();
        let mut seen = Vec::new();
        let state = run_frames(&mut clock, 1000, |tick| {
            seen.push(tick.elapsed);
            wall.advance(secs(0.5));
            ControlFlow::Continue(())
        });
        assert_eq!(state, ClockState::Completed);
        assert_eq!(seen, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }
}
