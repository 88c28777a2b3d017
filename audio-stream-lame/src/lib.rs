//! # audio-stream-lame
//!
//! LAME MP3 backend for audio-stream.
//!
//! Provides:
//! - `LameMp3Encoder`: constant-bitrate MP3 via LAME, implementing `AudioEncoder`
//! - `FrameSplitter`: cuts LAME output into one MPEG frame per packet
//! - `initialize`: registers the encoder for `CodecId::Mp3` in the core registry
//! - `open_default_stream`: MP3 over RTP to `rtp://127.0.0.1:37777`
//!
//! ## Usage
//! ```ignore
//! use audio_stream_core::AudioSpec;
//!
//! let pipeline = audio_stream_lame::open_default_stream(AudioSpec::default())?;
//! pipeline.write(&pcm)?;
//! pipeline.close()?;
//! ```

pub mod mp3_encoder;
pub mod mpeg_frame;

pub use mp3_encoder::{LameError, LameMp3Encoder};
pub use mpeg_frame::FrameSplitter;

use audio_stream_core::{registry, AudioSpec, CodecId, Pipeline, StreamConfig, StreamError};

/// Initialize the core registry and register the MP3 encoder. Idempotent.
pub fn initialize() -> Result<(), StreamError> {
    registry::initialize();
    registry::register_encoder(CodecId::Mp3, mp3_encoder::open)
}

/// Open a pipeline streaming MP3 to the default loopback endpoint.
pub fn open_default_stream(spec: AudioSpec) -> Result<Pipeline, StreamError> {
    open_stream(spec, StreamConfig::default())
}

/// Open a pipeline with the LAME encoder registered.
pub fn open_stream(spec: AudioSpec, config: StreamConfig) -> Result<Pipeline, StreamError> {
    initialize()?;
    Pipeline::open(spec, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;
    use std::time::Duration;

    use audio_stream_core::transport::rtp::{RtpHeader, MPA_PAYLOAD_TYPE, RTP_HEADER_SIZE};
    use audio_stream_core::{AudioProcessor, SampleFormat};

    #[test]
    fn initialize_registers_mp3() {
        initialize().unwrap();
        initialize().unwrap();
        assert!(registry::global().find_encoder(CodecId::Mp3).is_ok());
    }

    #[test]
    fn rejects_three_channels() {
        let spec = AudioSpec {
            channels: 3,
            ..Default::default()
        };
        assert!(matches!(
            open_default_stream(spec),
            Err(StreamError::UnsupportedChannels(3))
        ));
    }

    #[test]
    fn streams_mp3_over_rtp() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let config = StreamConfig {
            output_url: format!("rtp://127.0.0.1:{}", receiver.local_addr().unwrap().port()),
            ..Default::default()
        };
        let spec = AudioSpec {
            sample_rate_hz: 44100,
            sample_format: SampleFormat::S16,
            channels: 2,
            buffer_size_samples: 4096,
        };

        let pipeline = open_stream(spec, config).unwrap();
        assert_eq!(pipeline.frame_size(), 4608);

        // Two seconds of tone from the capture side, fed back in as playback.
        let mut pcm = vec![0u8; pipeline.frame_size()];
        for _ in 0..40 {
            pipeline.read_data(&mut pcm).unwrap();
            pipeline.write_data(&pcm).unwrap();
        }
        pipeline.close().unwrap();

        let mut buf = [0u8; 2048];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        let header = RtpHeader::parse(&buf[..n]).unwrap();
        assert_eq!(header.payload_type, MPA_PAYLOAD_TYPE);
        assert!(n > RTP_HEADER_SIZE + 4);
    }
}
