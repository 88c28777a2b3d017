use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::StreamError;

/// PCM sample layout delivered by the producer.
///
/// The two packed 24-bit layouts can be described by a host but are not
/// accepted by the streaming pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    /// Unsigned 8-bit.
    #[serde(rename = "u8")]
    U8,
    /// Signed 16-bit, little-endian.
    #[serde(rename = "s16")]
    S16,
    /// Signed 32-bit, little-endian.
    #[serde(rename = "s32")]
    S32,
    /// IEEE single-precision float, little-endian.
    #[serde(rename = "f32")]
    F32,
    /// Signed 8.23 fixed point in 32 bits.
    #[serde(rename = "packed8_24")]
    Packed8_24,
    /// Signed .23 fixed point packed in 3 bytes.
    #[serde(rename = "packed24")]
    Packed24,
}

impl SampleFormat {
    /// Bytes per sample for formats the pipeline can encode.
    pub fn bytes_per_sample(&self) -> Option<usize> {
        match self {
            Self::U8 => Some(1),
            Self::S16 => Some(2),
            Self::S32 | Self::F32 => Some(4),
            Self::Packed8_24 | Self::Packed24 => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.bytes_per_sample().is_some()
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U8 => "PCM_8_BIT",
            Self::S16 => "PCM_16_BIT",
            Self::S32 => "PCM_32_BIT",
            Self::F32 => "PCM_FLOAT",
            Self::Packed8_24 => "PCM_8_24_BIT",
            Self::Packed24 => "PCM_24_BIT_PACKED",
        };
        f.write_str(name)
    }
}

/// Channel layout derived from a channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn from_count(channels: u8) -> Result<Self, StreamError> {
        match channels {
            1 => Ok(Self::Mono),
            2 => Ok(Self::Stereo),
            other => Err(StreamError::UnsupportedChannels(other)),
        }
    }

    pub fn channel_count(&self) -> u8 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// Audio stream type a host refers to when toggling standby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioStreamType {
    Output,
    Input,
}

/// Format of the PCM stream pushed into a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSpec {
    pub sample_rate_hz: u32,
    pub sample_format: SampleFormat,
    pub channels: u8,
    /// Host-side buffer size in samples. Informational for the pipeline.
    pub buffer_size_samples: u16,
}

impl AudioSpec {
    /// Check that the pipeline can encode this format.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.sample_rate_hz == 0 {
            return Err(StreamError::ConfigurationFailed(
                "sample rate must be positive".into(),
            ));
        }
        if !self.sample_format.is_supported() {
            return Err(StreamError::UnsupportedSampleFormat(self.sample_format));
        }
        ChannelLayout::from_count(self.channels)?;
        Ok(())
    }

    pub fn channel_layout(&self) -> Result<ChannelLayout, StreamError> {
        ChannelLayout::from_count(self.channels)
    }

    /// Size in bytes of one interleaved sample frame (one sample per channel).
    pub fn bytes_per_sample_frame(&self) -> Result<usize, StreamError> {
        let bytes = self
            .sample_format
            .bytes_per_sample()
            .ok_or(StreamError::UnsupportedSampleFormat(self.sample_format))?;
        Ok(bytes * self.channels as usize)
    }

    /// Size in bytes of one codec frame of `samples_per_frame` samples.
    pub fn frame_size(&self, samples_per_frame: usize) -> Result<usize, StreamError> {
        Ok(self.bytes_per_sample_frame()? * samples_per_frame)
    }
}

impl Default for AudioSpec {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            sample_format: SampleFormat::S16,
            channels: 1,
            buffer_size_samples: 4096,
        }
    }
}
