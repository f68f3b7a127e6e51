//! White-noise buffer used as the rain texture.

use rand::Rng;

/// Length of the noise buffer in seconds.
pub const NOISE_SECONDS: u32 = 2;

/// Attenuation applied to every sample.
pub const NOISE_LEVEL: f32 = 0.2;

/// Fill a buffer of `NOISE_SECONDS * sample_rate` samples with independent
/// uniform values in `[-NOISE_LEVEL, NOISE_LEVEL]`.
pub fn noise_buffer(sample_rate: u32) -> Vec<f32> {
    noise_buffer_with(&mut rand::thread_rng(), sample_rate)
}

/// Same as [`noise_buffer`] with a caller-supplied generator.
pub fn noise_buffer_with<R: Rng + ?Sized>(rng: &mut R, sample_rate: u32) -> Vec<f32> {
    let len = NOISE_SECONDS as usize * sample_rate as usize;
    (0..len)
        .map(|_| rng.gen_range(-1.0f32..=1.0) * NOISE_LEVEL)
        .collect()
}
