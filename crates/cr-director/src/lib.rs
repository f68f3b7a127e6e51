//! Session controller for the cinereel composition.
//!
//! The `Director` owns at most one playback session. Starting a session
//! spawns a render thread that opens the output, arms the composition on a
//! fresh `RenderContext` and then feeds the device until the composition
//! ends or the director stops it. The presentation tracks progress with a
//! `PlaybackClock` anchored at the same start instant.

pub mod clock;
pub mod composition;
mod error;
pub mod narration;
mod render;
pub mod session;
mod wav;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Instant;

use cr_audio::AudioOutput;
use cr_engine::{Frame, RenderContext};
use cr_ir::AudioTime;

pub use clock::{run_frames, ClockState, ManualClock, PlaybackClock, SystemClock, Tick, WallClock};
pub use cr_audio::{AudioError, AudioHost, CpalHost, NullHost, OutputConfig};
pub use error::DirectorError;
pub use narration::{Cue, CueTimers, Narrator, CUES};
pub use render::{render_composition, render_to_wav, TAIL_SECONDS};
pub use session::{ArmedSession, ScheduleReport, SessionGraph};
pub use wav::{frames_to_wav, write_wav};

/// Frames rendered per write to the output.
const RENDER_BLOCK: usize = 256;

#[derive(Clone, Copy, Debug)]
pub struct DirectorConfig {
    pub output: OutputConfig,
    /// Deliver narration cues to the narrator, if one is attached
    pub narration: bool,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self { output: OutputConfig::default(), narration: true }
    }
}

/// What a successful `start` hands back to the presentation.
#[derive(Clone, Copy, Debug)]
pub struct SessionStart {
    /// Wall instant both clocks count from
    pub started_at: Instant,
    /// Audio-clock reading the schedule was built from
    pub reference: AudioTime,
    pub sample_rate: u32,
    pub scheduled: ScheduleReport,
}

/// Sent by the render thread once the session is armed.
struct Ready {
    sample_rate: u32,
    reference: AudioTime,
    report: ScheduleReport,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    frames_rendered: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    cues: Option<CueTimers>,
    sample_rate: u32,
    started_at: Instant,
}

/// Owns the playback session.
pub struct Director {
    host: Arc<dyn AudioHost>,
    narrator: Option<Arc<dyn Narrator>>,
    config: DirectorConfig,
    playback: Option<PlaybackHandle>,
}

impl Director {
    pub fn new(host: Arc<dyn AudioHost>) -> Self {
        Self { host, narrator: None, config: DirectorConfig::default(), playback: None }
    }

    pub fn with_config(mut self, config: DirectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    // --- Session lifecycle ---

    /// Begin a session, replacing any session already running.
    ///
    /// Blocks until the render thread has opened the output and armed the
    /// whole schedule.
    pub fn start(&mut self) -> Result<SessionStart, DirectorError> {
        self.stop();

        let stop_signal = Arc::new(AtomicBool::new(false));
        let frames_rendered = Arc::new(AtomicU64::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let host = self.host.clone();
        let output_config = self.config.output;
        let stop = stop_signal.clone();
        let frames = frames_rendered.clone();
        let done = finished.clone();

        let thread = std::thread::Builder::new()
            .name("cr-render".into())
            .spawn(move || render_thread(host, output_config, ready_tx, stop, frames, done))
            .map_err(DirectorError::RenderThread)?;

        let ready = match ready_rx.recv() {
            Ok(Ok(ready)) => ready,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(DirectorError::RenderThreadLost);
            }
        };

        let started_at = Instant::now();
        let cues = match (&self.narrator, self.config.narration) {
            (Some(narrator), true) => match CueTimers::spawn(narrator.clone(), &CUES, started_at) {
                Ok(timers) => Some(timers),
                Err(e) => {
                    tracing::warn!(error = %e, "narration unavailable");
                    None
                }
            },
            _ => None,
        };

        tracing::info!(
            sample_rate = ready.sample_rate,
            scheduled = ready.report.applied,
            dropped = ready.report.failed,
            "session started"
        );

        self.playback = Some(PlaybackHandle {
            stop_signal,
            frames_rendered,
            finished,
            thread: Some(thread),
            cues,
            sample_rate: ready.sample_rate,
            started_at,
        });

        Ok(SessionStart {
            started_at,
            reference: ready.reference,
            sample_rate: ready.sample_rate,
            scheduled: ready.report,
        })
    }

    /// End the session, if any: cancel pending narration, release the
    /// render context and the output. Does nothing when idle.
    pub fn stop(&mut self) {
        let Some(mut pb) = self.playback.take() else {
            return;
        };
        if let Some(cues) = pb.cues.take() {
            let spoken = cues.cancel();
            tracing::debug!(spoken, "narration cancelled");
        }
        pb.stop_signal.store(true, Ordering::Relaxed);
        if let Some(handle) = pb.thread.take() {
            if handle.join().is_err() {
                tracing::warn!("render thread panicked");
            }
        }
        tracing::info!("session stopped");
    }

    /// A session exists and its render thread is still running.
    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Acquire))
    }

    /// The session's render thread has finished on its own.
    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Acquire))
    }

    /// Audio clock of the current session, as far as the render thread has
    /// rendered.
    pub fn audio_time(&self) -> Option<AudioTime> {
        let pb = self.playback.as_ref()?;
        Some(AudioTime::from_frame(pb.frames_rendered.load(Ordering::Relaxed), pb.sample_rate))
    }

    /// Wall instant the current session started.
    pub fn started_at(&self) -> Option<Instant> {
        self.playback.as_ref().map(|p| p.started_at)
    }
}

impl Default for Director {
    fn default() -> Self {
        Self::new(Arc::new(CpalHost))
    }
}

impl Drop for Director {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open the output and arm the composition on a fresh context.
fn open_session(
    host: &dyn AudioHost,
    config: &OutputConfig,
) -> Result<(Box<dyn AudioOutput>, RenderContext, ArmedSession), DirectorError> {
    let mut output = host.open(config)?;
    let mut ctx = RenderContext::new(output.sample_rate());
    let armed = session::arm(&mut ctx)?;
    if let Err(e) = output.start() {
        session::release(&mut ctx, &armed.graph);
        return Err(e.into());
    }
    Ok((output, ctx, armed))
}

fn render_thread(
    host: Arc<dyn AudioHost>,
    config: OutputConfig,
    ready: mpsc::Sender<Result<Ready, DirectorError>>,
    stop_signal: Arc<AtomicBool>,
    frames_rendered: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
) {
    let (mut output, mut ctx, armed) = match open_session(&*host, &config) {
        Ok(session) => session,
        Err(e) => {
            finished.store(true, Ordering::Release);
            let _ = ready.send(Err(e));
            return;
        }
    };

    let sample_rate = ctx.sample_rate();
    let handshake = Ready { sample_rate, reference: armed.reference, report: armed.report };
    if ready.send(Ok(handshake)).is_err() {
        session::release(&mut ctx, &armed.graph);
        finished.store(true, Ordering::Release);
        return;
    }

    let end_frame = armed.end.to_frame(sample_rate);
    let mut block = [Frame::silence(); RENDER_BLOCK];
    let mut completed = false;

    while !stop_signal.load(Ordering::Relaxed) {
        let remaining = end_frame.saturating_sub(ctx.current_frame());
        if remaining == 0 {
            completed = true;
            break;
        }
        let n = (remaining as usize).min(RENDER_BLOCK);
        ctx.render_into(&mut block[..n]);
        if let Err(e) = output.write(&block[..n]) {
            tracing::warn!(error = %e, "output write failed, ending session");
            break;
        }
        frames_rendered.store(ctx.current_frame(), Ordering::Relaxed);
    }

    session::release(&mut ctx, &armed.graph);

    if completed {
        let silence = [Frame::silence(); RENDER_BLOCK];
        let mut tail = (TAIL_SECONDS * sample_rate as f64) as usize;
        while tail > 0 && !stop_signal.load(Ordering::Relaxed) {
            let n = tail.min(RENDER_BLOCK);
            if output.write(&silence[..n]).is_err() {
                break;
            }
            tail -= n;
        }
        tracing::info!("composition finished");
    }

    if let Err(e) = output.stop() {
        tracing::warn!(error = %e, "output stop failed");
    }
    drop(output);
    finished.store(true, Ordering::Release);
}
