//! Process-wide tables of encoders and output formats.
//!
//! Must be initialized once with [`initialize`] before a pipeline is opened
//! through [`Pipeline::open`](crate::Pipeline::open). Initialization is
//! idempotent; backends then add their encoders with [`register_encoder`].

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::models::codec::{CodecId, EncoderParameters};
use crate::models::error::StreamError;
use crate::traits::encoder::AudioEncoder;
use crate::traits::packet_sink::PacketSink;
use crate::transport::rtp_muxer::{MuxerOptions, RtpMuxer};
use crate::transport::udp::OutputUrl;

/// Opens an encoder for the given parameters.
pub type EncoderFactory = fn(&EncoderParameters) -> Result<Box<dyn AudioEncoder>, StreamError>;

/// Opens an output for the given options.
pub type SinkFactory = fn(&MuxerOptions) -> Result<Box<dyn PacketSink>, StreamError>;

/// An output format selected by URL scheme.
#[derive(Clone, Copy)]
pub struct OutputFormat {
    pub name: &'static str,
    pub open: SinkFactory,
}

struct Tables {
    encoders: Vec<(CodecId, EncoderFactory)>,
    formats: Vec<OutputFormat>,
}

pub struct CodecRegistry {
    initialized: AtomicBool,
    tables: RwLock<Tables>,
}

impl CodecRegistry {
    pub const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            tables: parking_lot::const_rwlock(Tables {
                encoders: Vec::new(),
                formats: Vec::new(),
            }),
        }
    }

    /// Register the built-in output formats. Safe to call repeatedly.
    pub fn initialize(&self) {
        if self.initialized.load(Ordering::Acquire) {
            return;
        }
        let mut tables = self.tables.write();
        if self.initialized.load(Ordering::Acquire) {
            return;
        }
        tables.formats.push(OutputFormat {
            name: "rtp",
            open: open_rtp,
        });
        self.initialized.store(true, Ordering::Release);
        log::debug!("Codec registry initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Add or replace the encoder factory for `codec`.
    pub fn register_encoder(&self, codec: CodecId, factory: EncoderFactory) -> Result<(), StreamError> {
        if !self.is_initialized() {
            return Err(StreamError::NotInitialized);
        }
        let mut tables = self.tables.write();
        tables.encoders.retain(|(id, _)| *id != codec);
        tables.encoders.push((codec, factory));
        log::debug!("Registered encoder for {}", codec);
        Ok(())
    }

    pub fn find_encoder(&self, codec: CodecId) -> Result<EncoderFactory, StreamError> {
        if !self.is_initialized() {
            return Err(StreamError::NotInitialized);
        }
        self.tables
            .read()
            .encoders
            .iter()
            .find(|(id, _)| *id == codec)
            .map(|(_, factory)| *factory)
            .ok_or_else(|| StreamError::EncoderNotFound(codec.to_string()))
    }

    /// Look up the output format for `url` by its scheme.
    pub fn find_output_format(&self, url: &str) -> Result<OutputFormat, StreamError> {
        if !self.is_initialized() {
            return Err(StreamError::NotInitialized);
        }
        let parsed = OutputUrl::parse(url)?;
        self.tables
            .read()
            .formats
            .iter()
            .find(|f| f.name == parsed.scheme)
            .copied()
            .ok_or_else(|| StreamError::TransportFormatNotFound(url.to_string()))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn open_rtp(options: &MuxerOptions) -> Result<Box<dyn PacketSink>, StreamError> {
    Ok(Box::new(RtpMuxer::open(options)?))
}

static GLOBAL: CodecRegistry = CodecRegistry::new();

/// The process-wide registry.
pub fn global() -> &'static CodecRegistry {
    &GLOBAL
}

/// Initialize the process-wide registry.
pub fn initialize() {
    GLOBAL.initialize();
}

pub fn is_initialized() -> bool {
    GLOBAL.is_initialized()
}

pub fn register_encoder(codec: CodecId, factory: EncoderFactory) -> Result<(), StreamError> {
    GLOBAL.register_encoder(codec, factory)
}
