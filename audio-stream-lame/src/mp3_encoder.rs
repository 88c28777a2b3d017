//! MP3 encoder on top of LAME.
//!
//! LAME holds back roughly one frame of input before emitting anything and
//! returns output in arbitrary chunks. The output is cut back into single
//! MPEG frames, each queued as one packet for `receive_packet`.

use std::collections::VecDeque;

use mp3lame_encoder::{max_required_buffer_size, Bitrate, Builder, DualPcm, Encoder, FlushNoGap, MonoPcm};
use thiserror::Error;

use audio_stream_core::models::codec::{EncodedPacket, EncoderOutput, EncoderParameters, RawFrame};
use audio_stream_core::models::error::StreamError;
use audio_stream_core::processing::sample_convert;
use audio_stream_core::traits::encoder::AudioEncoder;
use audio_stream_core::{ChannelLayout, SampleFormat};

use crate::mpeg_frame::FrameSplitter;

/// Bitrates LAME accepts in CBR mode, in kbit/s.
const BITRATES_KBPS: [u32; 16] = [8, 16, 24, 32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];

#[derive(Debug, Error)]
pub enum LameError {
    #[error("LAME could not allocate an encoder")]
    Allocation,

    #[error("LAME rejected {setting}: {reason}")]
    Setting { setting: &'static str, reason: String },

    #[error("LAME encode failed: {0}")]
    Encode(String),

    #[error("LAME flush failed: {0}")]
    Flush(String),
}

impl From<LameError> for StreamError {
    fn from(e: LameError) -> Self {
        match e {
            LameError::Allocation | LameError::Setting { .. } => StreamError::ConfigurationFailed(e.to_string()),
            LameError::Encode(_) => StreamError::EncodingFailed(e.to_string()),
            LameError::Flush(_) => StreamError::FlushFailed(e.to_string()),
        }
    }
}

/// MPEG Layer III frame length in samples per channel for a sample rate.
pub fn samples_per_frame(sample_rate_hz: u32) -> usize {
    if sample_rate_hz >= 32_000 {
        1152
    } else {
        576
    }
}

/// Closest CBR bitrate in kbit/s not above `bitrate_bps`, or the lowest one.
pub fn nearest_bitrate_kbps(bitrate_bps: u32) -> u32 {
    let kbps = bitrate_bps / 1000;
    BITRATES_KBPS
        .iter()
        .rev()
        .find(|&&rate| rate <= kbps)
        .copied()
        .unwrap_or(BITRATES_KBPS[0])
}

fn lame_bitrate(kbps: u32) -> Bitrate {
    match kbps {
        0..=8 => Bitrate::Kbps8,
        9..=16 => Bitrate::Kbps16,
        17..=24 => Bitrate::Kbps24,
        25..=32 => Bitrate::Kbps32,
        33..=40 => Bitrate::Kbps40,
        41..=48 => Bitrate::Kbps48,
        49..=64 => Bitrate::Kbps64,
        65..=80 => Bitrate::Kbps80,
        81..=96 => Bitrate::Kbps96,
        97..=112 => Bitrate::Kbps112,
        113..=128 => Bitrate::Kbps128,
        129..=160 => Bitrate::Kbps160,
        161..=192 => Bitrate::Kbps192,
        193..=224 => Bitrate::Kbps224,
        225..=256 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

/// [`AudioEncoder`] producing constant-bitrate MP3.
pub struct LameMp3Encoder {
    lame: Encoder,
    layout: ChannelLayout,
    sample_format: SampleFormat,
    samples_per_frame: usize,
    frame_bytes: usize,
    /// Timestamps of submitted frames not yet matched to an output packet.
    pending_pts: VecDeque<i64>,
    next_pts: i64,
    splitter: FrameSplitter,
    ready: VecDeque<EncodedPacket>,
    draining: bool,
}

impl LameMp3Encoder {
    pub fn new(params: &EncoderParameters) -> Result<Self, StreamError> {
        let layout = ChannelLayout::from_count(params.channels)?;
        let bytes_per_sample = params
            .sample_format
            .bytes_per_sample()
            .ok_or(StreamError::UnsupportedSampleFormat(params.sample_format))?;
        let kbps = nearest_bitrate_kbps(params.bitrate_bps);

        let lame = build(params, lame_bitrate(kbps))?;
        let samples_per_frame = samples_per_frame(params.sample_rate_hz);
        log::info!(
            "LAME MP3 encoder opened: {} Hz, {} ch, {} kbit/s, {} samples per frame",
            params.sample_rate_hz,
            params.channels,
            kbps,
            samples_per_frame
        );

        Ok(Self {
            lame,
            layout,
            sample_format: params.sample_format,
            samples_per_frame,
            frame_bytes: samples_per_frame * bytes_per_sample * params.channels as usize,
            pending_pts: VecDeque::new(),
            next_pts: 0,
            splitter: FrameSplitter::new(),
            ready: VecDeque::new(),
            draining: false,
        })
    }

    fn encode_pcm(&mut self, data: &[u8]) -> Result<Vec<u8>, LameError> {
        let samples = sample_convert::to_i16_samples(data, self.sample_format)
            .map_err(|e| LameError::Encode(e.to_string()))?;

        let mut out = Vec::with_capacity(max_required_buffer_size(samples.len()));
        match self.layout {
            ChannelLayout::Mono => self.lame.encode_to_vec(MonoPcm(samples.as_slice()), &mut out),
            ChannelLayout::Stereo => {
                let (left, right) = sample_convert::deinterleave(&samples);
                self.lame.encode_to_vec(
                    DualPcm {
                        left: left.as_slice(),
                        right: right.as_slice(),
                    },
                    &mut out,
                )
            }
        }
        .map_err(|e| LameError::Encode(format!("{:?}", e)))?;
        Ok(out)
    }

    fn flush_lame(&mut self) -> Result<Vec<u8>, LameError> {
        let mut out = Vec::with_capacity(max_required_buffer_size(0));
        self.lame
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| LameError::Flush(format!("{:?}", e)))?;
        Ok(out)
    }

    /// Queue one packet per complete MPEG frame in `data`.
    fn enqueue(&mut self, data: &[u8]) {
        self.splitter.push(data);
        let duration = self.samples_per_frame as i64;
        while let Some(frame) = self.splitter.next_frame() {
            let pts = self.pending_pts.pop_front().unwrap_or(self.next_pts);
            self.next_pts = self.next_pts.max(pts + duration);
            self.ready.push_back(EncodedPacket {
                data: frame,
                pts,
                duration,
                stream_index: 0,
            });
        }
    }
}

fn build(params: &EncoderParameters, bitrate: Bitrate) -> Result<Encoder, LameError> {
    let mut builder = Builder::new().ok_or(LameError::Allocation)?;
    builder
        .set_num_channels(params.channels)
        .map_err(|e| LameError::Setting {
            setting: "channels",
            reason: format!("{:?}", e),
        })?;
    builder
        .set_sample_rate(params.sample_rate_hz)
        .map_err(|e| LameError::Setting {
            setting: "sample rate",
            reason: format!("{:?}", e),
        })?;
    builder.set_brate(bitrate).map_err(|e| LameError::Setting {
        setting: "bitrate",
        reason: format!("{:?}", e),
    })?;
    // No Xing/Info frame: every frame sent is audio.
    builder.set_to_write_vbr_tag(false).map_err(|e| LameError::Setting {
        setting: "vbr tag",
        reason: format!("{:?}", e),
    })?;
    builder.build().map_err(|e| LameError::Setting {
        setting: "parameters",
        reason: format!("{:?}", e),
    })
}

impl AudioEncoder for LameMp3Encoder {
    fn name(&self) -> &str {
        "lame-mp3"
    }

    fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }

    fn send_frame(&mut self, frame: Option<RawFrame<'_>>) -> Result<(), StreamError> {
        if self.draining {
            return match frame {
                None => Ok(()),
                Some(_) => Err(StreamError::EncodingFailed("encoder is draining".into())),
            };
        }

        let Some(frame) = frame else {
            self.draining = true;
            let out = self.flush_lame()?;
            self.enqueue(&out);
            let partial = self.splitter.clear();
            if partial > 0 {
                log::warn!("Dropped {} bytes of incomplete MP3 frame at flush", partial);
            }
            return Ok(());
        };

        if frame.data.len() != self.frame_bytes {
            return Err(StreamError::EncodingFailed(format!(
                "frame of {} bytes, expected {}",
                frame.data.len(),
                self.frame_bytes
            )));
        }

        let encoded = self.encode_pcm(frame.data)?;
        self.pending_pts.push_back(frame.pts);
        self.enqueue(&encoded);
        Ok(())
    }

    fn receive_packet(&mut self) -> Result<EncoderOutput, StreamError> {
        if let Some(packet) = self.ready.pop_front() {
            return Ok(EncoderOutput::Packet(packet));
        }
        if self.draining {
            Ok(EncoderOutput::EndOfStream)
        } else {
            Ok(EncoderOutput::NeedsInput)
        }
    }
}

/// Registry factory for the MP3 codec.
pub fn open(params: &EncoderParameters) -> Result<Box<dyn AudioEncoder>, StreamError> {
    Ok(Box::new(LameMp3Encoder::new(params)?))
}
