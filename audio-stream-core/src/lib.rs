//! # audio-stream-core
//!
//! Platform-agnostic capture-to-stream pipeline.
//!
//! Raw PCM pushed by a host is staged in a bounded buffer, cut into
//! codec-sized frames, encoded on one background thread and muxed onto an
//! RTP/UDP transport. Codec backends (LAME MP3) implement the `AudioEncoder`
//! trait and register themselves in the process-wide registry.
//!
//! ## Architecture
//!
//! ```text
//! audio-stream-core (this crate)
//! ├── traits/       ← AudioEncoder, PacketSink, DatagramTransport, AudioProcessor
//! ├── models/       ← StreamError, AudioSpec, StreamConfig, PipelineState, codec types
//! ├── processing/   ← CaptureBuffer, FrameSlicer, sample conversion, tone generator
//! ├── session/      ← Pipeline (lifecycle controller), EncoderStateMachine
//! ├── transport/    ← RtpMuxer, RTP/MPA packetizer, SDP header, UDP transport
//! └── registry      ← encoder factories and output formats
//! ```

pub mod models;
pub mod processing;
pub mod registry;
pub mod session;
pub mod traits;
pub mod transport;

// Re-export key types at crate root for convenience.
pub use models::audio_spec::{AudioSpec, AudioStreamType, ChannelLayout, SampleFormat};
pub use models::codec::{CodecId, EncodedPacket, EncoderOutput, EncoderParameters, RawFrame, StreamParameters};
pub use models::config::StreamConfig;
pub use models::error::StreamError;
pub use models::state::{EncoderState, PipelineDiagnostics, PipelineState};
pub use processing::capture_buffer::CaptureBuffer;
pub use processing::frame_slicer::FrameSlicer;
pub use session::encoder_machine::EncoderStateMachine;
pub use session::pipeline::Pipeline;
pub use traits::audio_processor::AudioProcessor;
pub use traits::encoder::AudioEncoder;
pub use traits::packet_sink::PacketSink;
pub use traits::transport::DatagramTransport;
pub use transport::rtp_muxer::{MuxerOptions, RtpMuxer};
