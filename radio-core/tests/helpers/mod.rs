//! Test helpers for radio-core integration tests
//!
//! - fakes: in-memory playlist source and decoder, engine harness
//! - audio_generator: WAV fixtures written with hound

#![allow(dead_code)]

pub mod audio_generator;
pub mod fakes;

pub use fakes::{entry, fast_format, tagged_track, EngineHarness, FakeDecoder, FakeSource};
