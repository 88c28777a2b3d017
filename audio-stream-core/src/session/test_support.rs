//! Fakes shared by the session tests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::models::codec::{EncodedPacket, EncoderOutput, RawFrame};
use crate::models::error::StreamError;
use crate::traits::encoder::AudioEncoder;
use crate::traits::packet_sink::PacketSink;

/// What a [`FakeEncoder`] was asked to do.
#[derive(Debug, Default)]
pub struct EncoderLog {
    pub submitted: Vec<i64>,
    pub frame_lengths: Vec<usize>,
    pub flushes: usize,
}

/// A latch that holds encoder submissions until opened.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }
}

/// Encoder that emits one packet per frame after holding `delay` frames.
pub struct FakeEncoder {
    log: Arc<Mutex<EncoderLog>>,
    samples_per_frame: usize,
    delay: usize,
    held: VecDeque<i64>,
    ready: VecDeque<EncodedPacket>,
    draining: bool,
    fail_flush: bool,
    endless_flush: bool,
    fail_submission: Option<usize>,
    gate: Option<Arc<Gate>>,
}

impl FakeEncoder {
    pub fn new(samples_per_frame: usize, delay: usize) -> (Self, Arc<Mutex<EncoderLog>>) {
        let log = Arc::new(Mutex::new(EncoderLog::default()));
        let encoder = Self {
            log: Arc::clone(&log),
            samples_per_frame,
            delay,
            held: VecDeque::new(),
            ready: VecDeque::new(),
            draining: false,
            fail_flush: false,
            endless_flush: false,
            fail_submission: None,
            gate: None,
        };
        (encoder, log)
    }

    /// Refuse the end-of-input signal.
    pub fn failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }

    /// Never report end of stream once draining.
    pub fn endless_flush(mut self) -> Self {
        self.endless_flush = true;
        self
    }

    /// Fail the `n`th submitted frame (zero based).
    pub fn failing_submission(mut self, n: usize) -> Self {
        self.fail_submission = Some(n);
        self
    }

    /// Block every submission until `gate` opens.
    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn packet(&self, pts: i64) -> EncodedPacket {
        EncodedPacket {
            data: pts.to_be_bytes()[4..].to_vec(),
            pts,
            duration: self.samples_per_frame as i64,
            stream_index: usize::MAX,
        }
    }
}

impl AudioEncoder for FakeEncoder {
    fn name(&self) -> &str {
        "fake"
    }

    fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }

    fn send_frame(&mut self, frame: Option<RawFrame<'_>>) -> Result<(), StreamError> {
        let Some(frame) = frame else {
            self.log.lock().flushes += 1;
            if self.fail_flush {
                return Err(StreamError::EncodingFailed("flush refused".into()));
            }
            self.draining = true;
            while let Some(pts) = self.held.pop_front() {
                let packet = self.packet(pts);
                self.ready.push_back(packet);
            }
            return Ok(());
        };

        if let Some(gate) = &self.gate {
            gate.wait();
        }
        let index = {
            let mut log = self.log.lock();
            log.submitted.push(frame.pts);
            log.frame_lengths.push(frame.data.len());
            log.submitted.len() - 1
        };
        if self.fail_submission == Some(index) {
            return Err(StreamError::EncodingFailed(format!("frame {} rejected", index)));
        }

        self.held.push_back(frame.pts);
        while self.held.len() > self.delay {
            if let Some(pts) = self.held.pop_front() {
                let packet = self.packet(pts);
                self.ready.push_back(packet);
            }
        }
        Ok(())
    }

    fn receive_packet(&mut self) -> Result<EncoderOutput, StreamError> {
        if let Some(packet) = self.ready.pop_front() {
            return Ok(EncoderOutput::Packet(packet));
        }
        if self.draining {
            if self.endless_flush {
                return Ok(EncoderOutput::Packet(self.packet(-1)));
            }
            return Ok(EncoderOutput::EndOfStream);
        }
        Ok(EncoderOutput::NeedsInput)
    }
}

/// What a [`RecordingSink`] received.
#[derive(Debug, Default)]
pub struct SinkLog {
    pub packets: Vec<EncodedPacket>,
    pub close_calls: usize,
    pub closed: bool,
}

pub struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
    fail_writes: bool,
    fail_close: bool,
}

impl RecordingSink {
    pub fn new() -> (Self, Arc<Mutex<SinkLog>>) {
        let log = Arc::new(Mutex::new(SinkLog::default()));
        let sink = Self {
            log: Arc::clone(&log),
            fail_writes: false,
            fail_close: false,
        };
        (sink, log)
    }

    pub fn failing_writes() -> (Self, Arc<Mutex<SinkLog>>) {
        let (mut sink, log) = Self::new();
        sink.fail_writes = true;
        (sink, log)
    }

    pub fn failing_close() -> (Self, Arc<Mutex<SinkLog>>) {
        let (mut sink, log) = Self::new();
        sink.fail_close = true;
        (sink, log)
    }
}

impl PacketSink for RecordingSink {
    fn stream_index(&self) -> usize {
        0
    }

    fn write_packet(&mut self, packet: &EncodedPacket) -> Result<(), StreamError> {
        let mut log = self.log.lock();
        if log.closed {
            return Err(StreamError::MuxFailed("sink is closed".into()));
        }
        if self.fail_writes {
            return Err(StreamError::MuxFailed("network unreachable".into()));
        }
        log.packets.push(packet.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        let mut log = self.log.lock();
        log.close_calls += 1;
        log.closed = true;
        if self.fail_close {
            return Err(StreamError::TrailerWriteFailed("control path down".into()));
        }
        Ok(())
    }
}
