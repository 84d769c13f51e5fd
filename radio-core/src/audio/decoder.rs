//! Audio decoder using symphonia
//!
//! Decodes a whole file to interleaved signed 16-bit little-endian PCM at
//! the file's own frame rate and channel count. No resampling and no
//! channel remixing: the stream carries each track's native layout.

use crate::error::{Error, Result};
use bytes::Bytes;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::types::PcmFormat;

/// A fully decoded track
#[derive(Debug, Clone)]
pub struct DecodedTrack {
    pub pcm: Bytes,
    pub format: PcmFormat,
}

impl DecodedTrack {
    /// Playing time of the decoded audio
    pub fn duration(&self) -> std::time::Duration {
        self.format.duration_of(self.pcm.len())
    }
}

/// Turns a track file into raw PCM.
///
/// The engine decodes through this trait so tests can substitute synthetic
/// audio for real files.
pub trait TrackDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedTrack>;
}

/// Decoder backed by symphonia's default format and codec registries
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl TrackDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedTrack> {
        debug!("Decoding entire file: {}", path.display());

        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "no audio track found".to_string(),
            })?;

        let track_id = track.id;
        let mut frame_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut pcm: Vec<u8> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<i16>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of file");
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!("Stream reset required in {}, stopping decode", path.display());
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packet: drop it and keep going
                    warn!("Decode error: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            };

            let spec = *decoded.spec();
            frame_rate.get_or_insert(spec.rate);
            channels.get_or_insert(spec.channels.count() as u16);

            let needed = decoded.capacity() * spec.channels.count();
            if sample_buf.as_ref().map_or(true, |b| b.capacity() < needed) {
                sample_buf = Some(SampleBuffer::<i16>::new(decoded.capacity() as u64, spec));
            }

            if let Some(buf) = sample_buf.as_mut() {
                buf.copy_interleaved_ref(decoded);
                for sample in buf.samples() {
                    pcm.extend_from_slice(&sample.to_le_bytes());
                }
            }
        }

        let (Some(frame_rate), Some(channels)) = (frame_rate, channels) else {
            return Err(Error::Decode {
                path: path.to_path_buf(),
                reason: "sample rate or channel count unknown".to_string(),
            });
        };

        if pcm.is_empty() {
            return Err(Error::Decode {
                path: path.to_path_buf(),
                reason: "no audio decoded".to_string(),
            });
        }

        let track = DecodedTrack {
            pcm: Bytes::from(pcm),
            format: PcmFormat::s16(frame_rate, channels),
        };

        debug!(
            "Decoded {} bytes ({:.1}s) at {}Hz, {} channel(s)",
            track.pcm.len(),
            track.duration().as_secs_f64(),
            frame_rate,
            channels
        );

        Ok(track)
    }
}
