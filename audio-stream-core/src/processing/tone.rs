use std::f32::consts::TAU;

use crate::models::audio_spec::AudioSpec;
use crate::models::error::StreamError;
use crate::processing::sample_convert;

/// Continuous sine tone rendered in a pipeline's PCM format.
///
/// Serves the synthetic capture path: hosts reading audio back get a
/// steady tone instead of silence. Phase carries over between calls.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    spec: AudioSpec,
    frequency_hz: f32,
    amplitude: f32,
    phase: f32,
    /// Bytes of a partially emitted sample frame from the previous fill.
    pending: Vec<u8>,
}

impl ToneGenerator {
    pub fn new(spec: AudioSpec, frequency_hz: f32, amplitude: f32) -> Self {
        Self {
            spec,
            frequency_hz,
            amplitude: amplitude.clamp(0.0, 1.0),
            phase: 0.0,
            pending: Vec::new(),
        }
    }

    /// Fill `dest` entirely with tone samples.
    pub fn fill(&mut self, dest: &mut [u8]) -> Result<usize, StreamError> {
        if dest.is_empty() {
            return Err(StreamError::InvalidArgument("empty read buffer".into()));
        }

        let frame_bytes = self.spec.bytes_per_sample_frame()?;
        let step = TAU * self.frequency_hz / self.spec.sample_rate_hz as f32;

        let mut written = 0;
        let mut frame = std::mem::take(&mut self.pending);
        loop {
            if !frame.is_empty() {
                let n = frame.len().min(dest.len() - written);
                dest[written..written + n].copy_from_slice(&frame[..n]);
                frame.drain(..n);
                written += n;
            }
            if written == dest.len() {
                break;
            }

            let value = self.amplitude * self.phase.sin();
            self.phase = (self.phase + step) % TAU;
            frame.clear();
            frame.reserve(frame_bytes);
            for _ in 0..self.spec.channels {
                sample_convert::push_sample(&mut frame, value, self.spec.sample_format)?;
            }
        }
        self.pending = frame;
        Ok(written)
    }
}
