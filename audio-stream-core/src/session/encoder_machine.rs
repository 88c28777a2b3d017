use std::time::{Duration, Instant};

use crate::models::codec::{EncoderOutput, RawFrame};
use crate::models::error::StreamError;
use crate::models::state::EncoderState;
use crate::traits::encoder::AudioEncoder;
use crate::traits::packet_sink::PacketSink;

/// Packets moved from the encoder to the sink by one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub packets_muxed: u64,
    pub mux_errors: u64,
}

/// Drives an [`AudioEncoder`] through its submit/drain protocol.
///
/// ```text
/// idle ──encode──→ encoding ──flush──→ draining ──→ closed
///   └────────────────flush───────────────↗
/// ```
pub struct EncoderStateMachine {
    encoder: Box<dyn AudioEncoder>,
    state: EncoderState,
}

impl EncoderStateMachine {
    pub fn new(encoder: Box<dyn AudioEncoder>) -> Self {
        Self {
            encoder,
            state: EncoderState::Idle,
        }
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    pub fn name(&self) -> &str {
        self.encoder.name()
    }

    pub fn samples_per_frame(&self) -> usize {
        self.encoder.samples_per_frame()
    }

    /// Submit one frame and mux every packet the encoder has ready.
    ///
    /// Mux failures are logged and counted; encoder failures are returned and
    /// the frame is lost.
    pub fn encode(&mut self, frame: RawFrame<'_>, sink: &mut dyn PacketSink) -> Result<DrainSummary, StreamError> {
        if !self.state.accepts_frames() {
            return Err(StreamError::EncodingFailed(format!(
                "encoder is {:?}, cannot accept frames",
                self.state
            )));
        }
        self.state = EncoderState::Encoding;

        self.encoder.send_frame(Some(frame))?;
        let mut summary = DrainSummary::default();
        loop {
            match self.encoder.receive_packet()? {
                EncoderOutput::Packet(mut packet) => {
                    packet.stream_index = sink.stream_index();
                    match sink.write_packet(&packet) {
                        Ok(()) => summary.packets_muxed += 1,
                        Err(e) => {
                            log::warn!("Dropping packet at pts {}: {}", packet.pts, e);
                            summary.mux_errors += 1;
                        }
                    }
                }
                EncoderOutput::NeedsInput | EncoderOutput::EndOfStream => break,
            }
        }
        Ok(summary)
    }

    /// Signal end of input and mux everything the encoder still holds.
    ///
    /// Legal before any frame was encoded. After the first call the machine
    /// is closed and later calls do nothing.
    pub fn flush(&mut self, sink: &mut dyn PacketSink, timeout: Option<Duration>) -> Result<DrainSummary, StreamError> {
        if self.state == EncoderState::Closed {
            return Ok(DrainSummary::default());
        }
        self.state = EncoderState::Draining;
        let result = self.drain(sink, timeout.map(|t| Instant::now() + t));
        self.state = EncoderState::Closed;

        if let Ok(summary) = &result {
            log::debug!("{} encoder drained {} packets", self.encoder.name(), summary.packets_muxed);
        }
        result
    }

    fn drain(&mut self, sink: &mut dyn PacketSink, deadline: Option<Instant>) -> Result<DrainSummary, StreamError> {
        self.encoder
            .send_frame(None)
            .map_err(|e| StreamError::FlushFailed(e.to_string()))?;

        let mut summary = DrainSummary::default();
        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(StreamError::Timeout);
            }
            let output = self
                .encoder
                .receive_packet()
                .map_err(|e| StreamError::FlushFailed(e.to_string()))?;

            match output {
                EncoderOutput::Packet(mut packet) => {
                    packet.stream_index = sink.stream_index();
                    sink.write_packet(&packet)
                        .map_err(|e| StreamError::FlushFailed(e.to_string()))?;
                    summary.packets_muxed += 1;
                }
                EncoderOutput::NeedsInput | EncoderOutput::EndOfStream => return Ok(summary),
            }
        }
    }
}
