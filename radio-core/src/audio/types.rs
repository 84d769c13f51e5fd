//! PCM format and chunk types shared by the engine and the broadcast hub

use bytes::Bytes;
use serde::Serialize;

/// Default chunk size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Raw PCM layout of a track.
///
/// Carried alongside every chunk rather than embedded in the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PcmFormat {
    /// Frames per second
    pub frame_rate: u32,
    /// Bytes per sample (1..=4), little-endian signed
    pub sample_width: u16,
    /// Interleaved channel count
    pub channels: u16,
}

impl PcmFormat {
    pub const fn new(frame_rate: u32, sample_width: u16, channels: u16) -> Self {
        Self {
            frame_rate,
            sample_width,
            channels,
        }
    }

    /// Signed 16-bit interleaved, the decoder's output format
    pub const fn s16(frame_rate: u32, channels: u16) -> Self {
        Self::new(frame_rate, 2, channels)
    }

    /// Bytes of PCM consumed per second of audio
    pub fn bytes_per_second(&self) -> u64 {
        self.frame_rate as u64 * self.sample_width as u64 * self.channels as u64
    }

    /// Bytes per interleaved frame
    pub fn frame_size(&self) -> usize {
        self.sample_width as usize * self.channels as usize
    }

    /// Largest whole number of frames that fits in `requested` bytes, at least one frame.
    ///
    /// Chunks cut at this size always start on a frame boundary.
    pub fn align_chunk_size(&self, requested: usize) -> usize {
        let frame = self.frame_size().max(1);
        (requested / frame).max(1) * frame
    }

    /// Wall-clock duration of `bytes` of PCM in this format
    pub fn duration_of(&self, bytes: usize) -> std::time::Duration {
        let bps = self.bytes_per_second();
        if bps == 0 {
            return std::time::Duration::ZERO;
        }
        std::time::Duration::from_secs_f64(bytes as f64 / bps as f64)
    }
}

/// One block of PCM on its way to the listeners.
///
/// The bytes are reference counted: fanning a chunk out to N listeners
/// clones a pointer, not the audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub data: Bytes,
    pub format: PcmFormat,
}

impl AudioChunk {
    pub fn new(data: impl Into<Bytes>, format: PcmFormat) -> Self {
        Self {
            data: data.into(),
            format,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Real-time duration this chunk represents
    pub fn duration(&self) -> std::time::Duration {
        self.format.duration_of(self.data.len())
    }
}

/// Split a decoded PCM buffer into chunks of `chunk_size` bytes.
///
/// The last chunk may be shorter. Slicing `Bytes` shares the allocation.
pub fn split_chunks(pcm: &Bytes, chunk_size: usize) -> impl Iterator<Item = Bytes> + '_ {
    let chunk_size = chunk_size.max(1);
    (0..pcm.len())
        .step_by(chunk_size)
        .map(move |start| pcm.slice(start..(start + chunk_size).min(pcm.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cd_quality_pacing() {
        let format = PcmFormat::s16(44100, 2);
        assert_eq!(format.bytes_per_second(), 176_400);
        assert_eq!(format.frame_size(), 4);

        // 1024 bytes of 44.1kHz stereo s16 is ~5.8ms
        let d = format.duration_of(DEFAULT_CHUNK_SIZE);
        assert!((d.as_secs_f64() - 1024.0 / 176_400.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_rate_has_zero_duration() {
        let format = PcmFormat::new(0, 2, 2);
        assert_eq!(format.duration_of(1024), Duration::ZERO);
    }

    #[test]
    fn test_split_chunks_keeps_remainder() {
        let pcm = Bytes::from(vec![7u8; 2500]);
        let sizes: Vec<usize> = split_chunks(&pcm, 1024).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![1024, 1024, 452]);
    }

    #[test]
    fn test_chunk_size_aligned_to_frames() {
        let stereo = PcmFormat::s16(44100, 2);
        assert_eq!(stereo.align_chunk_size(1024), 1024);
        assert_eq!(stereo.align_chunk_size(1001), 1000);
        assert_eq!(stereo.align_chunk_size(3), 4);

        let mono = PcmFormat::s16(22050, 1);
        assert_eq!(mono.align_chunk_size(1001), 1000);

        let pcm = Bytes::from(vec![0u8; 4000]);
        let size = stereo.align_chunk_size(1001);
        assert!(split_chunks(&pcm, size).all(|c| c.len() % stereo.frame_size() == 0));
    }

    #[test]
    fn test_split_chunks_empty_input() {
        let pcm = Bytes::new();
        assert_eq!(split_chunks(&pcm, 1024).count(), 0);
    }
}
