use crate::models::codec::{EncoderOutput, RawFrame};
use crate::models::error::StreamError;

/// A stateful audio encoder driven with a submit/drain protocol.
///
/// Implemented by:
/// - `LameMp3Encoder` (audio-stream-lame)
///
/// Encoders may hold several frames before producing their first packet, so
/// callers submit one frame and then pull until [`EncoderOutput::NeedsInput`].
pub trait AudioEncoder: Send {
    /// Short codec name for logs.
    fn name(&self) -> &str;

    /// Samples per channel the encoder expects in every frame.
    fn samples_per_frame(&self) -> usize;

    /// Submit one whole frame, or `None` to signal end of input.
    fn send_frame(&mut self, frame: Option<RawFrame<'_>>) -> Result<(), StreamError>;

    /// Pull the next encoded packet, if any.
    ///
    /// After end of input has been signalled, returns
    /// [`EncoderOutput::EndOfStream`] once everything buffered has been emitted.
    fn receive_packet(&mut self) -> Result<EncoderOutput, StreamError>;
}
