//! Phase-accumulator oscillator.

use cr_ir::Waveform;

use crate::error::EngineError;

/// A periodic tone generator.
#[derive(Clone, Debug)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    /// Position within the current cycle, 0.0..1.0
    phase: f64,
    /// Phase advance per frame
    increment: f64,
}

impl Oscillator {
    /// Create an oscillator, rejecting frequencies outside `(0, sample_rate / 2)`.
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: u32) -> Result<Self, EngineError> {
        let nyquist = sample_rate as f32 / 2.0;
        if !frequency.is_finite() || frequency <= 0.0 || frequency >= nyquist {
            return Err(EngineError::InvalidFrequency(frequency));
        }
        Ok(Self {
            waveform,
            frequency,
            phase: 0.0,
            increment: frequency as f64 / sample_rate as f64,
        })
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Produce the next sample and advance the phase.
    pub fn next_sample(&mut self) -> f32 {
        let value = match self.waveform {
            Waveform::Sine => (self.phase * core::f64::consts::TAU).sin() as f32,
            Waveform::Triangle => triangle(self.phase),
        };
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }
}

/// Triangle wave starting at zero and rising, peak at a quarter cycle.
fn triangle(phase: f64) -> f32 {
    let v = if phase < 0.25 {
        4.0 * phase
    } else if phase < 0.75 {
        2.0 - 4.0 * phase
    } else {
        4.0 * phase - 4.0
    };
    v as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_frequencies() {
        for f in [0.0, -10.0, f32::NAN, f32::INFINITY, 24_000.0] {
            assert!(matches!(
                Oscillator::new(Waveform::Sine, f, 48_000),
                Err(EngineError::InvalidFrequency(_))
            ));
        }
    }

    #[test]
    fn sine_completes_a_cycle() {
        // 1 kHz at 8 kHz: 8 frames per cycle
        let mut osc = Oscillator::new(Waveform::Sine, 1000.0, 8000).unwrap();
        let samples: Vec<f32> = (0..8).map(|_| osc.next_sample()).collect();
        assert!(samples[0].abs() < 1e-6);
        assert!((samples[2] - 1.0).abs() < 1e-6);
        assert!((samples[6] + 1.0).abs() < 1e-6);
        assert!(osc.next_sample().abs() < 1e-5);
    }

    #[test]
    fn triangle_shape() {
        let mut osc = Oscillator::new(Waveform::Triangle, 1000.0, 8000).unwrap();
        let samples: Vec<f32> = (0..8).map(|_| osc.next_sample()).collect();
        let expected = [0.0, 0.5, 1.0, 0.5, 0.0, -0.5, -1.0, -0.5];
        for (got, want) in samples.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{samples:?}");
        }
    }

    #[test]
    fn output_stays_in_unit_range() {
        let mut osc = Oscillator::new(Waveform::Triangle, 261.63, 44_100).unwrap();
        for _ in 0..44_100 {
            let s = osc.next_sample();
            assert!((-1.0..=1.0).contains(&s));
        }
    }
}
