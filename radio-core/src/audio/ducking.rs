//! Live-voice ducking
//!
//! While the DJ is live, music is attenuated by a fixed number of decibels.
//! Gain is applied per sample and the result is clipped to the sample range.
//! Samples are little-endian signed integers of 1 to 4 bytes.

use bytes::Bytes;

use super::types::AudioChunk;

/// Default attenuation while the DJ is live
pub const DEFAULT_DUCK_DB: f32 = 10.0;

/// Linear gain for an attenuation of `db` decibels (10 dB -> ~0.3162)
pub fn attenuation_gain(db: f32) -> f64 {
    10f64.powf(-(db as f64) / 20.0)
}

/// Applies a fixed attenuation to PCM chunks
#[derive(Debug, Clone, Copy)]
pub struct Ducker {
    gain: f64,
}

impl Ducker {
    pub fn new(attenuation_db: f32) -> Self {
        Self {
            gain: attenuation_gain(attenuation_db),
        }
    }

    /// Attenuated copy of `chunk`, same format
    pub fn apply(&self, chunk: &AudioChunk) -> AudioChunk {
        AudioChunk {
            data: scale_pcm(&chunk.data, chunk.format.sample_width, self.gain),
            format: chunk.format,
        }
    }
}

impl Default for Ducker {
    fn default() -> Self {
        Self::new(DEFAULT_DUCK_DB)
    }
}

/// Multiply every sample in `data` by `gain`, clipping to the sample range.
///
/// Trailing bytes that do not form a whole sample are copied unchanged.
/// Unsupported widths leave the data untouched.
pub fn scale_pcm(data: &[u8], sample_width: u16, gain: f64) -> Bytes {
    let width = sample_width as usize;
    if !(1..=4).contains(&width) {
        return Bytes::copy_from_slice(data);
    }

    let bits = (width * 8) as u32;
    let max = (1i64 << (bits - 1)) - 1;
    let min = -(1i64 << (bits - 1));

    let mut out = Vec::with_capacity(data.len());
    let mut samples = data.chunks_exact(width);

    for sample in samples.by_ref() {
        let value = read_sample(sample);
        let scaled = ((value as f64) * gain).round() as i64;
        write_sample(scaled.clamp(min, max), width, &mut out);
    }
    out.extend_from_slice(samples.remainder());

    Bytes::from(out)
}

/// Decode one little-endian signed sample of 1..=4 bytes
fn read_sample(bytes: &[u8]) -> i64 {
    let mut raw = [0u8; 4];
    raw[..bytes.len()].copy_from_slice(bytes);
    let unsigned = u32::from_le_bytes(raw);
    // Sign-extend from the sample's top bit
    let shift = 32 - (bytes.len() as u32 * 8);
    ((unsigned << shift) as i32 >> shift) as i64
}

fn write_sample(value: i64, width: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&(value as i32).to_le_bytes()[..width]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::types::PcmFormat;

    fn peak(data: &[u8], width: usize) -> i64 {
        data.chunks_exact(width)
            .map(|s| read_sample(s).abs())
            .max()
            .unwrap_or(0)
    }

    fn s16_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_ten_db_gain() {
        let gain = attenuation_gain(10.0);
        assert!((gain - 0.316_227_766).abs() < 1e-6);
        assert_eq!(attenuation_gain(0.0), 1.0);
    }

    #[test]
    fn test_peak_scaled_by_gain_s16() {
        let input = s16_bytes(&[0, 10_000, -20_000, 32_767, -32_768, 123]);
        let chunk = AudioChunk::new(input.clone(), PcmFormat::s16(44100, 2));

        let ducked = Ducker::default().apply(&chunk);
        assert_eq!(ducked.len(), chunk.len());
        assert_eq!(ducked.format, chunk.format);

        let expected = (peak(&input, 2) as f64 * 0.3162).round() as i64;
        let actual = peak(&ducked.data, 2);
        assert!((actual - expected).abs() <= 2, "peak {} vs expected {}", actual, expected);
    }

    #[test]
    fn test_each_sample_rounded() {
        let input = s16_bytes(&[1000, -1000]);
        let out = scale_pcm(&input, 2, attenuation_gain(10.0));
        assert_eq!(out.as_ref(), s16_bytes(&[316, -316]).as_slice());
    }

    #[test]
    fn test_gain_above_unity_clips() {
        let input = s16_bytes(&[30_000, -30_000]);
        let out = scale_pcm(&input, 2, 2.0);
        assert_eq!(out.as_ref(), s16_bytes(&[i16::MAX, i16::MIN]).as_slice());
    }

    #[test]
    fn test_24_bit_sign_extension() {
        // -4_000_000 as 24-bit little-endian
        let value: i32 = -4_000_000;
        let input = value.to_le_bytes()[..3].to_vec();
        assert_eq!(read_sample(&input), -4_000_000);

        let out = scale_pcm(&input, 3, 0.5);
        assert_eq!(read_sample(&out), -2_000_000);
    }

    #[test]
    fn test_8_and_32_bit() {
        let out = scale_pcm(&[100u8, (-100i8) as u8], 1, 0.5);
        assert_eq!(out.as_ref(), &[50u8, (-50i8) as u8]);

        let input = i32::MAX.to_le_bytes();
        let out = scale_pcm(&input, 4, 0.5);
        assert_eq!(read_sample(&out), (i32::MAX as f64 * 0.5).round() as i64);
    }

    #[test]
    fn test_partial_trailing_sample_kept() {
        let mut input = s16_bytes(&[2000]);
        input.push(0xAB);
        let out = scale_pcm(&input, 2, 0.5);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2], 0xAB);
    }

    #[test]
    fn test_unsupported_width_is_identity() {
        let input = vec![1u8, 2, 3, 4, 5];
        assert_eq!(scale_pcm(&input, 0, 0.5).as_ref(), input.as_slice());
        assert_eq!(scale_pcm(&input, 8, 0.5).as_ref(), input.as_slice());
    }

    #[test]
    fn test_odd_chunk_request_still_ducks_every_sample() {
        use crate::audio::types::{split_chunks, PcmFormat};

        let format = PcmFormat::s16(44100, 1);
        let pcm: Vec<u8> = std::iter::repeat(1000i16.to_le_bytes())
            .take(1024)
            .flatten()
            .collect();
        let pcm = Bytes::from(pcm);
        let ducker = Ducker::default();

        let size = format.align_chunk_size(1001);
        let mut samples = Vec::new();
        for data in split_chunks(&pcm, size) {
            let out = ducker.apply(&AudioChunk::new(data, format));
            samples.extend(out.data.chunks_exact(2).map(|s| i16::from_le_bytes([s[0], s[1]])));
        }

        assert_eq!(samples.len(), 1024);
        assert!(samples.iter().all(|&s| s == 316));
    }
}
