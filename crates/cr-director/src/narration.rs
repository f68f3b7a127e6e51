//! Narration cues and the timer thread that delivers them.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use cr_ir::SEGMENTS;

/// A line of narration, due `offset` after session start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cue {
    pub offset: Duration,
    pub text: &'static str,
    /// BCP 47 language tag
    pub lang: &'static str,
    pub rate: f32,
    pub pitch: f32,
}

const RATE: f32 = 0.95;
const PITCH: f32 = 1.0;

/// The composition's narration, voicing the first three captions.
pub const CUES: [Cue; 3] = [
    Cue { offset: Duration::from_secs(0), text: SEGMENTS[0].caption, lang: "en-IN", rate: RATE, pitch: PITCH },
    Cue { offset: Duration::from_secs(9), text: SEGMENTS[1].caption, lang: "hi-IN", rate: RATE, pitch: PITCH },
    Cue { offset: Duration::from_secs(19), text: SEGMENTS[2].caption, lang: "en-IN", rate: RATE, pitch: PITCH },
];

/// Something that can voice a cue, e.g. a speech synthesizer.
///
/// `speak` is called from the timer thread and should not block for long.
pub trait Narrator: Send + Sync {
    fn speak(&self, cue: &Cue);
}

/// Pending cues of one session. Dropping it cancels whatever has not fired.
pub struct CueTimers {
    cancel: Option<Sender<()>>,
    thread: Option<JoinHandle<usize>>,
}

impl CueTimers {
    /// Deliver `cues` to `narrator`, each at `origin + cue.offset`.
    pub fn spawn(
        narrator: Arc<dyn Narrator>,
        cues: &'static [Cue],
        origin: Instant,
    ) -> std::io::Result<Self> {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let thread = std::thread::Builder::new()
            .name("cr-narration".into())
            .spawn(move || {
                let mut spoken = 0;
                for cue in cues {
                    let wait = (origin + cue.offset).saturating_duration_since(Instant::now());
                    match cancelled.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            narrator.speak(cue);
                            spoken += 1;
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                spoken
            })?;
        Ok(Self { cancel: Some(cancel), thread: Some(thread) })
    }

    /// Cancel pending cues and wait for the timer thread. Returns how many
    /// cues were spoken.
    pub fn cancel(mut self) -> usize {
        self.shutdown()
    }

    fn shutdown(&mut self) -> usize {
        if let Some(cancel) = self.cancel.take() {
            // The thread may already have finished all cues.
            let _ = cancel.send(());
        }
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(spoken)) => spoken,
            Some(Err(_)) => {
                tracing::warn!("narration thread panicked");
                0
            }
            None => 0,
        }
    }
}

impl Drop for CueTimers {
    fn drop(&mut self) {
        self.shutdown();
    }
}
