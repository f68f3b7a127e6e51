//! Output that discards audio, for headless runs and tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cr_engine::Frame;

use crate::traits::{AudioError, AudioHost, AudioOutput, OutputConfig};

/// Counters shared between a `NullHost` and the outputs it opened.
#[derive(Debug, Default)]
struct Counters {
    open: AtomicUsize,
    opened: AtomicUsize,
    frames: AtomicU64,
}

/// Discards frames. When paced, `write` sleeps so the audio clock tracks
/// the wall clock, like a real device would.
pub struct NullOutput {
    sample_rate: u32,
    paced: bool,
    /// Wall instant and frame count pacing is measured from.
    started: Option<(Instant, u64)>,
    written: u64,
    counters: Arc<Counters>,
}

impl AudioOutput for NullOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn write(&mut self, frames: &[Frame]) -> Result<(), AudioError> {
        let written = self.written;
        let (started, base) = *self.started.get_or_insert_with(|| (Instant::now(), written));
        self.written += frames.len() as u64;
        self.counters.frames.fetch_add(frames.len() as u64, Ordering::Relaxed);
        if self.paced {
            let due = Duration::from_secs_f64((self.written - base) as f64 / self.sample_rate as f64);
            if let Some(ahead) = due.checked_sub(started.elapsed()) {
                std::thread::sleep(ahead);
            }
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.started = Some((Instant::now(), self.written));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.started = None;
        Ok(())
    }
}

impl Drop for NullOutput {
    fn drop(&mut self) {
        self.counters.open.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Host that opens `NullOutput`s and records how many are alive.
#[derive(Clone, Debug)]
pub struct NullHost {
    sample_rate: u32,
    paced: bool,
    available: bool,
    counters: Arc<Counters>,
}

impl NullHost {
    /// Outputs render as fast as the render thread can go.
    pub fn unpaced(sample_rate: u32) -> Self {
        Self { sample_rate, paced: false, available: true, counters: Arc::default() }
    }

    /// Outputs consume frames in real time.
    pub fn paced(sample_rate: u32) -> Self {
        Self { paced: true, ..Self::unpaced(sample_rate) }
    }

    /// A host with no output device.
    pub fn unavailable() -> Self {
        Self { available: false, ..Self::unpaced(48_000) }
    }

    /// Outputs currently open.
    pub fn open_outputs(&self) -> usize {
        self.counters.open.load(Ordering::Relaxed)
    }

    /// Outputs opened over the host's lifetime.
    pub fn opened_total(&self) -> usize {
        self.counters.opened.load(Ordering::Relaxed)
    }

    /// Frames written across every output.
    pub fn frames_written(&self) -> u64 {
        self.counters.frames.load(Ordering::Relaxed)
    }
}

impl AudioHost for NullHost {
    fn open(&self, _config: &OutputConfig) -> Result<Box<dyn AudioOutput>, AudioError> {
        if !self.available {
            return Err(AudioError::NoDevice);
        }
        self.counters.open.fetch_add(1, Ordering::Relaxed);
        self.counters.opened.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(NullOutput {
            sample_rate: self.sample_rate,
            paced: self.paced,
            started: None,
            written: 0,
            counters: self.counters.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_open_outputs() {
        let host = NullHost::unpaced(8_000);
        let out = host.open(&OutputConfig::default()).unwrap();
        assert_eq!(host.open_outputs(), 1);
        assert_eq!(out.sample_rate(), 8_000);
        drop(out);
        assert_eq!(host.open_outputs(), 0);
        assert_eq!(host.opened_total(), 1);
    }

    #[test]
    fn unavailable_host_reports_no_device() {
        let host = NullHost::unavailable();
        assert_eq!(host.open(&OutputConfig::default()).err(), Some(AudioError::NoDevice));
        assert_eq!(host.open_outputs(), 0);
    }

    #[test]
    fn paced_output_tracks_wall_clock() {
        let host = NullHost::paced(1_000);
        let mut out = host.open(&OutputConfig::default()).unwrap();
        out.start().unwrap();
        let begin = Instant::now();
        out.write(&[Frame::silence(); 50]).unwrap();
        assert!(begin.elapsed() >= Duration::from_millis(45));
        assert_eq!(host.frames_written(), 50);
    }

    #[test]
    fn unpaced_output_counts_frames() {
        let host = NullHost::unpaced(1_000);
        let mut out = host.open(&OutputConfig::default()).unwrap();
        out.write(&[Frame::silence(); 5_000]).unwrap();
        assert_eq!(host.frames_written(), 5_000);
    }
}
