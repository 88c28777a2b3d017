use thiserror::Error;

use super::audio_spec::SampleFormat;

/// Errors that can occur while configuring, running, or tearing down a stream.
///
/// Configuration errors are fatal to pipeline construction. Encoding and mux
/// errors raised on the processing thread are logged and never reach the producer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("capture buffer is closed")]
    Closed,

    #[error("unsupported audio format: {0}")]
    UnsupportedSampleFormat(SampleFormat),

    #[error("unsupported audio channel count: {0}")]
    UnsupportedChannels(u8),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("codec registry is not initialized")]
    NotInitialized,

    #[error("no encoder registered for {0}")]
    EncoderNotFound(String),

    #[error("no output format for {0}")]
    TransportFormatNotFound(String),

    #[error("failed to allocate output stream: {0}")]
    StreamAllocationFailed(String),

    #[error("failed to open transport {url}: {reason}")]
    TransportOpenFailed { url: String, reason: String },

    #[error("failed to write header: {0}")]
    HeaderWriteFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("mux failed: {0}")]
    MuxFailed(String),

    #[error("flush failed: {0}")]
    FlushFailed(String),

    #[error("failed to write trailer: {0}")]
    TrailerWriteFailed(String),

    #[error("timeout")]
    Timeout,
}

impl StreamError {
    /// Whether this error belongs to the construction phase of a pipeline.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedSampleFormat(_)
                | Self::UnsupportedChannels(_)
                | Self::ConfigurationFailed(_)
                | Self::NotInitialized
                | Self::EncoderNotFound(_)
                | Self::TransportFormatNotFound(_)
                | Self::StreamAllocationFailed(_)
                | Self::TransportOpenFailed { .. }
                | Self::HeaderWriteFailed(_)
        )
    }
}
