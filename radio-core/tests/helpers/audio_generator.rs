//! Deterministic WAV files for decoder tests

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

/// Write `frames` frames of a 440 Hz sine at half scale
pub fn write_sine_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    frames: u32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;

    for n in 0..frames {
        let t = n as f32 / sample_rate as f32;
        let sample = (0.5 * (2.0 * PI * 440.0 * t).sin() * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()
}

/// Write a mono file where every sample equals `value`
pub fn write_constant_wav(
    path: &Path,
    sample_rate: u32,
    frames: u32,
    value: i16,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for _ in 0..frames {
        writer.write_sample(value)?;
    }
    writer.finalize()
}
