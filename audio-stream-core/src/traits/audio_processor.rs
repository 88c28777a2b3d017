use crate::models::audio_spec::AudioStreamType;
use crate::models::error::StreamError;

/// Audio surface a host drives: playback data in, capture data out.
///
/// Methods take `&self`; implementations synchronize internally so a host
/// may call them from its own audio threads.
pub trait AudioProcessor: Send + Sync {
    /// Push a chunk of playback audio. Returns the number of bytes accepted.
    ///
    /// May block while downstream processing catches up.
    fn write_data(&self, data: &[u8]) -> Result<usize, StreamError>;

    /// Fill `data` with capture audio. Returns the number of bytes produced.
    fn read_data(&self, data: &mut [u8]) -> Result<usize, StreamError>;

    /// Called when a stream enters standby.
    fn standby(&self, stream: AudioStreamType) -> Result<(), StreamError> {
        let _ = stream;
        Ok(())
    }

    /// Called when a stream becomes active again.
    fn activate(&self, stream: AudioStreamType) -> Result<(), StreamError> {
        let _ = stream;
        Ok(())
    }

    /// Whether the host should keep feeding silence while output is in standby.
    fn need_silence_on_standby(&self) -> bool {
        false
    }
}
