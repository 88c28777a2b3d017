use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::codec::CodecId;
use super::error::StreamError;

/// Well-known local endpoint the stream is published on.
pub const DEFAULT_OUTPUT_URL: &str = "rtp://127.0.0.1:37777";

/// Default capacity of the capture buffer in bytes (50 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 50 * 1024;

/// Default encoder bitrate in bits per second.
pub const DEFAULT_BITRATE_BPS: u32 = 64_000;

/// Configuration for a streaming pipeline.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Transport URL, `rtp://host:port` (default: `rtp://127.0.0.1:37777`).
    pub output_url: String,

    /// Codec the stream is encoded with (default: MP3).
    pub codec: CodecId,

    /// Encoder bitrate in bits per second (default: 64000).
    pub bitrate_bps: u32,

    /// Capture buffer capacity in bytes (default: 51200).
    pub buffer_capacity: usize,

    /// Upper bound on how long the processing thread waits for data
    /// before re-checking for shutdown (default: 20ms).
    pub poll_interval_ms: u64,

    /// Optional bound on the encoder drain at shutdown (None = unbounded).
    pub flush_timeout_ms: Option<u64>,

    /// Key/value tags embedded in the stream header.
    pub metadata: BTreeMap<String, String>,

    /// Where to write the session description, if anywhere.
    pub sdp_path: Option<PathBuf>,
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.output_url.is_empty() {
            return Err(StreamError::ConfigurationFailed("output url is empty".into()));
        }
        if self.bitrate_bps == 0 {
            return Err(StreamError::ConfigurationFailed("bitrate must be positive".into()));
        }
        if self.buffer_capacity == 0 {
            return Err(StreamError::ConfigurationFailed(
                "buffer capacity must be positive".into(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(StreamError::ConfigurationFailed(
                "poll interval must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Check that one frame of `frame_size` bytes fits in the capture buffer.
    pub fn validate_frame_size(&self, frame_size: usize) -> Result<(), StreamError> {
        if frame_size == 0 || frame_size > self.buffer_capacity {
            return Err(StreamError::ConfigurationFailed(format!(
                "frame size {} does not fit buffer capacity {}",
                frame_size, self.buffer_capacity
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn flush_timeout(&self) -> Option<Duration> {
        self.flush_timeout_ms.map(Duration::from_millis)
    }

    pub fn from_json_str(json: &str) -> Result<Self, StreamError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StreamError::ConfigurationFailed(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, StreamError> {
        let json = fs::read_to_string(path).map_err(|e| {
            StreamError::ConfigurationFailed(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            output_url: DEFAULT_OUTPUT_URL.into(),
            codec: CodecId::Mp3,
            bitrate_bps: DEFAULT_BITRATE_BPS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            poll_interval_ms: 20,
            flush_timeout_ms: None,
            metadata: BTreeMap::from([(
                "anbox-platform".to_string(),
                "platform-audio-streaming".to_string(),
            )]),
            sdp_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StreamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output_url, "rtp://127.0.0.1:37777");
        assert_eq!(config.buffer_capacity, 51200);
        assert_eq!(config.bitrate_bps, 64000);
        assert_eq!(config.metadata.get("anbox-platform").map(String::as_str), Some("platform-audio-streaming"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = StreamConfig::from_json_str(r#"{ "bitrate_bps": 128000, "flush_timeout_ms": 500 }"#).unwrap();
        assert_eq!(config.bitrate_bps, 128000);
        assert_eq!(config.flush_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(config.output_url, DEFAULT_OUTPUT_URL);
        assert_eq!(config.codec, CodecId::Mp3);
    }

    #[test]
    fn rejects_zero_capacity() {
        let result = StreamConfig::from_json_str(r#"{ "buffer_capacity": 0 }"#);
        assert!(matches!(result, Err(StreamError::ConfigurationFailed(_))));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(StreamConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn frame_must_fit_buffer() {
        let config = StreamConfig {
            buffer_capacity: 1000,
            ..Default::default()
        };
        assert!(config.validate_frame_size(1000).is_ok());
        assert!(config.validate_frame_size(1001).is_err());
        assert!(config.validate_frame_size(0).is_err());
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("audio_stream_config_{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, r#"{ "output_url": "rtp://127.0.0.1:40000" }"#).unwrap();

        let config = StreamConfig::load(&path).unwrap();
        assert_eq!(config.output_url, "rtp://127.0.0.1:40000");

        fs::remove_file(&path).ok();
    }
}
