use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::audio_spec::{AudioSpec, AudioStreamType};
use crate::models::codec::{EncoderParameters, RawFrame, StreamParameters};
use crate::models::config::StreamConfig;
use crate::models::error::StreamError;
use crate::models::state::{PipelineDiagnostics, PipelineState};
use crate::processing::capture_buffer::CaptureBuffer;
use crate::processing::frame_slicer::FrameSlicer;
use crate::processing::tone::ToneGenerator;
use crate::registry;
use crate::traits::audio_processor::AudioProcessor;
use crate::traits::encoder::AudioEncoder;
use crate::traits::packet_sink::PacketSink;
use crate::transport::rtp_muxer::MuxerOptions;

use super::encoder_machine::EncoderStateMachine;

const ENCODER_THREAD_NAME: &str = "audio-stream-encoder";
const TONE_FREQUENCY_HZ: f32 = 440.0;
const TONE_AMPLITUDE: f32 = 0.5;

/// Everything the processing thread owns while running.
///
/// Handed back to the controller when the thread exits so the encoder can be
/// flushed and the sink closed on the controller's side. Field order is drop
/// order: the sink goes before the encoder.
struct PipelineContext {
    sink: Box<dyn PacketSink>,
    encoder: EncoderStateMachine,
    frame: Vec<u8>,
    next_pts: i64,
    frame_duration: i64,
}

impl PipelineContext {
    /// Encode the frame currently in `self.frame`.
    fn encode_staged(&mut self, diagnostics: &Mutex<PipelineDiagnostics>) {
        let pts = self.next_pts;
        self.next_pts += self.frame_duration;

        let frame = RawFrame { data: &self.frame, pts };
        let result = self.encoder.encode(frame, self.sink.as_mut());

        let mut d = diagnostics.lock();
        d.last_pts = Some(pts);
        match result {
            Ok(summary) => {
                d.frames_submitted += 1;
                d.packets_muxed += summary.packets_muxed;
                d.mux_errors += summary.mux_errors;
                log::debug!("Encoded frame at pts {} ({} packets)", pts, summary.packets_muxed);
            }
            Err(e) => {
                d.frames_dropped += 1;
                log::warn!("Dropping frame at pts {}: {}", pts, e);
            }
        }
    }

    /// Flush the encoder, then close the sink whatever the flush did.
    fn finish(self, flush_timeout: Option<Duration>, diagnostics: &Mutex<PipelineDiagnostics>) -> Result<(), StreamError> {
        let Self {
            mut sink,
            mut encoder,
            ..
        } = self;

        let flushed = encoder.flush(sink.as_mut(), flush_timeout);
        match &flushed {
            Ok(summary) => diagnostics.lock().packets_muxed += summary.packets_muxed,
            Err(e) => log::error!("Encoder flush failed: {}", e),
        }

        let closed = sink.close();
        if let Err(e) = &closed {
            log::error!("Failed to close output: {}", e);
        }

        drop(sink);
        drop(encoder);
        flushed.map(|_| ()).and(closed)
    }
}

/// Capture-to-stream pipeline: a bounded buffer fed by the caller, drained
/// by one background thread that encodes and muxes.
///
/// ```text
/// [producer] → write() → [CaptureBuffer] ─┐
///                                          │ audio-stream-encoder thread
///            [FrameSlicer] ← ──────────────┘
///                 ↓
///         [EncoderStateMachine] → [PacketSink] → network
/// ```
///
/// Dropping the pipeline, or calling [`close`](Self::close), stops the
/// thread, flushes the encoder and closes the sink in that order.
pub struct Pipeline {
    spec: AudioSpec,
    frame_size: usize,
    buffer: Arc<CaptureBuffer>,
    shutdown: Arc<AtomicBool>,
    state: Mutex<PipelineState>,
    diagnostics: Arc<Mutex<PipelineDiagnostics>>,
    worker: Option<thread::JoinHandle<PipelineContext>>,
    flush_timeout: Option<Duration>,
    tone: Mutex<ToneGenerator>,
}

impl Pipeline {
    /// Build a pipeline from the encoders and output formats in the
    /// process-wide registry.
    pub fn open(spec: AudioSpec, config: StreamConfig) -> Result<Self, StreamError> {
        validate(&spec, &config)?;

        let registry = registry::global();
        let open_encoder = registry.find_encoder(config.codec)?;
        let format = registry.find_output_format(&config.output_url)?;
        Self::configure(spec, config, open_encoder, format.open)
    }

    /// Build a pipeline with explicit encoder and sink constructors.
    ///
    /// Nothing is opened if `spec` or `config` is invalid. If the sink fails
    /// to open, the already opened encoder is released before returning.
    pub fn configure<E, S>(spec: AudioSpec, config: StreamConfig, open_encoder: E, open_sink: S) -> Result<Self, StreamError>
    where
        E: FnOnce(&EncoderParameters) -> Result<Box<dyn AudioEncoder>, StreamError>,
        S: FnOnce(&MuxerOptions) -> Result<Box<dyn PacketSink>, StreamError>,
    {
        Self::try_configure(spec, config, open_encoder, open_sink).inspect_err(|e| {
            log::error!("Pipeline configuration failed: {}", e);
        })
    }

    fn try_configure<E, S>(spec: AudioSpec, config: StreamConfig, open_encoder: E, open_sink: S) -> Result<Self, StreamError>
    where
        E: FnOnce(&EncoderParameters) -> Result<Box<dyn AudioEncoder>, StreamError>,
        S: FnOnce(&MuxerOptions) -> Result<Box<dyn PacketSink>, StreamError>,
    {
        validate(&spec, &config)?;
        log::info!(
            "Configuring pipeline: {} Hz, {}, {} ch -> {}",
            spec.sample_rate_hz,
            spec.sample_format,
            spec.channels,
            config.output_url
        );

        let params = EncoderParameters::new(config.codec, &spec, config.bitrate_bps);
        let encoder = EncoderStateMachine::new(open_encoder(&params)?);
        let samples_per_frame = encoder.samples_per_frame();
        let frame_size = spec.frame_size(samples_per_frame)?;
        config.validate_frame_size(frame_size)?;

        let mut options = MuxerOptions::new(
            config.output_url.clone(),
            StreamParameters {
                codec: config.codec,
                sample_rate_hz: spec.sample_rate_hz,
                channels: spec.channels,
                bitrate_bps: config.bitrate_bps,
                samples_per_frame,
            },
        );
        options.metadata = config.metadata.clone();
        options.sdp_path = config.sdp_path.clone();
        let sink = open_sink(&options)?;

        let context = PipelineContext {
            sink,
            encoder,
            frame: vec![0u8; frame_size],
            next_pts: 0,
            frame_duration: samples_per_frame as i64,
        };

        let buffer = Arc::new(CaptureBuffer::new(config.buffer_capacity));
        let shutdown = Arc::new(AtomicBool::new(false));
        let diagnostics = Arc::new(Mutex::new(PipelineDiagnostics::default()));

        let worker = {
            let buffer = Arc::clone(&buffer);
            let shutdown = Arc::clone(&shutdown);
            let diagnostics = Arc::clone(&diagnostics);
            let poll_interval = config.poll_interval();
            thread::Builder::new()
                .name(ENCODER_THREAD_NAME.into())
                .spawn(move || run(context, &buffer, &shutdown, &diagnostics, poll_interval))
                .map_err(|e| StreamError::ConfigurationFailed(format!("failed to spawn encoder thread: {}", e)))?
        };

        log::info!(
            "Pipeline running: {} samples per frame, {} byte frames, {} byte buffer",
            samples_per_frame,
            frame_size,
            config.buffer_capacity
        );

        Ok(Self {
            spec,
            frame_size,
            buffer,
            shutdown,
            state: Mutex::new(PipelineState::Running),
            diagnostics,
            worker: Some(worker),
            flush_timeout: config.flush_timeout(),
            tone: Mutex::new(ToneGenerator::new(spec, TONE_FREQUENCY_HZ, TONE_AMPLITUDE)),
        })
    }

    /// Push raw interleaved PCM, blocking while the buffer is full.
    pub fn write(&self, data: &[u8]) -> Result<usize, StreamError> {
        if !self.state().accepts_input() {
            return Err(StreamError::Closed);
        }
        let written = self.buffer.write(data)?;
        self.diagnostics.lock().bytes_written += written as u64;
        Ok(written)
    }

    /// Fill `data` with the synthetic capture tone.
    pub fn read(&self, data: &mut [u8]) -> Result<usize, StreamError> {
        self.tone.lock().fill(data)
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    pub fn spec(&self) -> &AudioSpec {
        &self.spec
    }

    /// Bytes per codec frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn diagnostics(&self) -> PipelineDiagnostics {
        self.diagnostics.lock().clone()
    }

    /// Stop the pipeline and report the first teardown failure.
    ///
    /// Resources are released whether or not flushing succeeds.
    pub fn close(mut self) -> Result<(), StreamError> {
        self.shutdown()
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock() = state;
        log::info!("Pipeline state: {:?}", state);
    }

    fn shutdown(&mut self) -> Result<(), StreamError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        self.set_state(PipelineState::Stopping);
        self.shutdown.store(true, Ordering::Release);
        self.buffer.close();

        let result = match worker.join() {
            Ok(context) => context.finish(self.flush_timeout, &self.diagnostics),
            Err(_) => {
                log::error!("Encoder thread panicked; output released without flush");
                Err(StreamError::FlushFailed("encoder thread panicked".into()))
            }
        };

        self.set_state(PipelineState::Closed);
        result
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        // Failures are already logged.
        let _ = self.shutdown();
    }
}

impl AudioProcessor for Pipeline {
    fn write_data(&self, data: &[u8]) -> Result<usize, StreamError> {
        self.write(data)
    }

    fn read_data(&self, data: &mut [u8]) -> Result<usize, StreamError> {
        self.read(data)
    }

    fn standby(&self, stream: AudioStreamType) -> Result<(), StreamError> {
        log::info!("{:?} stream entered standby", stream);
        Ok(())
    }

    fn activate(&self, stream: AudioStreamType) -> Result<(), StreamError> {
        log::info!("{:?} stream activated", stream);
        Ok(())
    }
}

fn validate(spec: &AudioSpec, config: &StreamConfig) -> Result<(), StreamError> {
    spec.validate()?;
    config.validate()
}

/// Processing loop: slice, encode and mux until shutdown.
fn run(
    mut context: PipelineContext,
    buffer: &CaptureBuffer,
    shutdown: &AtomicBool,
    diagnostics: &Mutex<PipelineDiagnostics>,
    poll_interval: Duration,
) -> PipelineContext {
    let slicer = FrameSlicer::new(context.frame.len());

    while !shutdown.load(Ordering::Acquire) {
        if slicer.wait_next_frame(buffer, &mut context.frame, poll_interval) {
            context.encode_staged(diagnostics);
        }
    }

    // The buffer is closed by now; whole frames staged before that still go out.
    while slicer.next_frame(buffer, &mut context.frame) {
        context.encode_staged(diagnostics);
    }
    let tail = buffer.len();
    if tail > 0 {
        log::debug!("Discarding {} bytes of partial frame", tail);
        buffer.clear();
    }

    context
}
