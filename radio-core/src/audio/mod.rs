//! Audio processing: PCM types, decoding, ducking

pub mod decoder;
pub mod ducking;
pub mod types;

pub use decoder::{DecodedTrack, SymphoniaDecoder, TrackDecoder};
pub use types::{AudioChunk, PcmFormat};
