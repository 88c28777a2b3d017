use crate::models::codec::EncodedPacket;
use crate::models::error::StreamError;

/// Destination for encoded packets: an opened output with one stream.
///
/// Implemented by:
/// - `RtpMuxer` (RTP over UDP)
pub trait PacketSink: Send {
    /// Index of the stream packets must be tagged with.
    fn stream_index(&self) -> usize;

    /// Submit one timestamped packet. Order of submission is preserved.
    fn write_packet(&mut self, packet: &EncodedPacket) -> Result<(), StreamError>;

    /// Write the trailer and release the output.
    ///
    /// Resources are released even when the trailer cannot be written.
    /// Calling `close` again is a no-op.
    fn close(&mut self) -> Result<(), StreamError>;
}
