//! WAV encoding for 16-bit stereo PCM.

use std::io::Write;

use cr_engine::Frame;

const CHANNELS: u16 = 2;
const BITS_PER_SAMPLE: u16 = 16;
const HEADER_LEN: usize = 44;

pub fn write_wav(w: &mut impl Write, frames: &[Frame], sample_rate: u32) -> std::io::Result<()> {
    let block_align = CHANNELS * (BITS_PER_SAMPLE / 8);
    // Header fields are 32-bit; out-of-range sizes saturate.
    let data_size = u32::try_from(frames.len())
        .unwrap_or(u32::MAX)
        .saturating_mul(block_align as u32);
    let byte_rate = sample_rate.saturating_mul(block_align as u32);

    w.write_all(b"RIFF")?;
    w.write_all(&data_size.saturating_add(36).to_le_bytes())?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?; // PCM
    w.write_all(&CHANNELS.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&byte_rate.to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for frame in frames {
        let (left, right) = frame.to_pcm16();
        w.write_all(&left.to_le_bytes())?;
        w.write_all(&right.to_le_bytes())?;
    }
    Ok(())
}

pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + frames.len() * 4);
    write_wav(&mut buf, frames, sample_rate).expect("Vec<u8> write cannot fail");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn header_layout() {
        let wav = frames_to_wav(&[Frame::silence(); 10], 44_100);
        assert_eq!(wav.len(), HEADER_LEN + 40);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 36 + 40);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 24), 44_100);
        assert_eq!(u32_at(&wav, 28), 44_100 * 4);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 40);
    }

    #[test]
    fn extreme_sample_rate_saturates_byte_rate() {
        let wav = frames_to_wav(&[], u32::MAX);
        assert_eq!(u32_at(&wav, 24), u32::MAX);
        assert_eq!(u32_at(&wav, 28), u32::MAX);
        assert_eq!(u32_at(&wav, 40), 0);
    }

    #[test]
    fn samples_are_clamped_pcm() {
        let frames = [Frame { left: 2.0, right: -0.5 }];
        let wav = frames_to_wav(&frames, 8_000);
        let left = i16::from_le_bytes([wav[44], wav[45]]);
        let right = i16::from_le_bytes([wav[46], wav[47]]);
        assert_eq!(left, i16::MAX);
        assert_eq!(right, -16383);
    }
}
