//! PCM sample conversion between the producer's wire formats and what
//! encoders consume.
//!
//! All multi-byte formats are little-endian and interleaved.

use crate::models::audio_spec::SampleFormat;
use crate::models::error::StreamError;

/// Decode interleaved PCM bytes into 16-bit samples.
///
/// Trailing bytes that do not form a whole sample are ignored.
pub fn to_i16_samples(data: &[u8], format: SampleFormat) -> Result<Vec<i16>, StreamError> {
    let samples = match format {
        SampleFormat::U8 => data.iter().map(|&b| ((b as i16) - 128) << 8).collect(),
        SampleFormat::S16 => data
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect(),
        SampleFormat::S32 => data
            .chunks_exact(4)
            .map(|c| (i32::from_le_bytes([c[0], c[1], c[2], c[3]]) >> 16) as i16)
            .collect(),
        SampleFormat::F32 => data
            .chunks_exact(4)
            .map(|c| f32_to_i16(f32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect(),
        SampleFormat::Packed8_24 | SampleFormat::Packed24 => {
            return Err(StreamError::UnsupportedSampleFormat(format));
        }
    };
    Ok(samples)
}

/// Convert an f32 sample `[-1.0, 1.0]` to 16-bit PCM, clamping out-of-range values.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * i16::MAX as f32) as i16
}

/// Append one f32 sample `[-1.0, 1.0]` to `out` encoded as `format`.
pub fn push_sample(out: &mut Vec<u8>, sample: f32, format: SampleFormat) -> Result<(), StreamError> {
    let clamped = sample.clamp(-1.0, 1.0);
    match format {
        SampleFormat::U8 => out.push((clamped * 127.0 + 128.0).round() as u8),
        SampleFormat::S16 => out.extend_from_slice(&f32_to_i16(clamped).to_le_bytes()),
        SampleFormat::S32 => out.extend_from_slice(&((clamped as f64 * i32::MAX as f64) as i32).to_le_bytes()),
        SampleFormat::F32 => out.extend_from_slice(&clamped.to_le_bytes()),
        SampleFormat::Packed8_24 | SampleFormat::Packed24 => {
            return Err(StreamError::UnsupportedSampleFormat(format));
        }
    }
    Ok(())
}

/// Split interleaved stereo into left and right channels.
pub fn deinterleave(stereo: &[i16]) -> (Vec<i16>, Vec<i16>) {
    let frames = stereo.len() / 2;
    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for pair in stereo.chunks_exact(2) {
        left.push(pair[0]);
        right.push(pair[1]);
    }
    (left, right)
}
