//! CPAL-based audio output backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use cr_engine::Frame;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::traits::{AudioError, AudioHost, AudioOutput, OutputConfig};

/// How long `write` waits for the device to drain before giving up.
const STALL_TIMEOUT: Duration = Duration::from_secs(1);

/// CPAL-based audio output.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    producer: HeapProd<Frame>,
    running: Arc<AtomicBool>,
}

impl CpalOutput {
    /// Create a new CPAL output with the default device.
    pub fn new(output: &OutputConfig) -> Result<(Self, HeapCons<Frame>), AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        let mut config: StreamConfig = config.into();
        // The stream callback writes the same mono signal to every channel
        // but assumes at least a stereo pair.
        config.channels = config.channels.max(2);

        let buffer_size = (config.sample_rate.0 as usize * output.buffer_ms.max(10) as usize / 1000).max(256);
        let rb = HeapRb::<Frame>::new(buffer_size);
        let (producer, consumer) = rb.split();

        tracing::debug!(
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            buffer_size,
            "opened cpal output"
        );

        let output = Self {
            device,
            config,
            stream: None,
            producer,
            running: Arc::new(AtomicBool::new(false)),
        };

        Ok((output, consumer))
    }

    /// Build the audio stream around the ring buffer's consumer half.
    pub fn build_stream(&mut self, mut consumer: HeapCons<Frame>) -> Result<(), AudioError> {
        let running = self.running.clone();
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }

                    for chunk in data.chunks_mut(channels) {
                        let frame = consumer.try_pop().unwrap_or_default();
                        for (i, sample) in chunk.iter_mut().enumerate() {
                            *sample = match i {
                                0 => frame.left,
                                1 => frame.right,
                                _ => 0.0,
                            };
                        }
                    }
                },
                |err| tracing::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn write(&mut self, frames: &[Frame]) -> Result<(), AudioError> {
        let mut pending = frames;
        let mut last_progress = Instant::now();
        while !pending.is_empty() {
            let pushed = self.producer.push_slice(pending);
            if pushed > 0 {
                pending = &pending[pushed..];
                last_progress = Instant::now();
                continue;
            }
            if last_progress.elapsed() > STALL_TIMEOUT {
                return Err(AudioError::Playback("output stalled".into()));
            }
            // Roughly a quarter of the ring at typical rates.
            let wait = self.producer.capacity().get() as u64 * 250_000 / self.config.sample_rate.0.max(1) as u64;
            std::thread::sleep(Duration::from_micros(wait.clamp(500, 20_000)));
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.running.store(true, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.running.store(false, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}

/// Opens the default cpal output device.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpalHost;

impl AudioHost for CpalHost {
    fn open(&self, config: &OutputConfig) -> Result<Box<dyn AudioOutput>, AudioError> {
        let (mut output, consumer) = CpalOutput::new(config)?;
        output.build_stream(consumer)?;
        Ok(Box::new(output))
    }
}
