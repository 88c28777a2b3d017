use std::fmt;

use serde::{Deserialize, Serialize};

use super::audio_spec::{AudioSpec, SampleFormat};

/// Codecs a stream can be encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecId {
    /// MPEG-1/2 Audio Layer III.
    Mp3,
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mp3 => f.write_str("mp3"),
        }
    }
}

/// Parameters an encoder is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParameters {
    pub codec: CodecId,
    pub sample_rate_hz: u32,
    pub sample_format: SampleFormat,
    pub channels: u8,
    pub bitrate_bps: u32,
}

impl EncoderParameters {
    pub fn new(codec: CodecId, spec: &AudioSpec, bitrate_bps: u32) -> Self {
        Self {
            codec,
            sample_rate_hz: spec.sample_rate_hz,
            sample_format: spec.sample_format,
            channels: spec.channels,
            bitrate_bps,
        }
    }
}

/// Parameters an output stream is allocated with, copied from the opened encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParameters {
    pub codec: CodecId,
    pub sample_rate_hz: u32,
    pub channels: u8,
    pub bitrate_bps: u32,
    /// Samples per channel in one codec frame.
    pub samples_per_frame: usize,
}

/// One codec frame of raw interleaved PCM.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    pub data: &'a [u8],
    /// Presentation timestamp in `1/sample_rate` units.
    pub pts: i64,
}

/// An encoded packet ready for muxing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPacket {
    pub data: Vec<u8>,
    /// Presentation timestamp in `1/sample_rate` units.
    pub pts: i64,
    /// Duration in `1/sample_rate` units.
    pub duration: i64,
    pub stream_index: usize,
}

/// Result of asking an encoder for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderOutput {
    Packet(EncodedPacket),
    /// Nothing more until another frame is submitted.
    NeedsInput,
    /// The encoder has been drained completely.
    EndOfStream,
}
