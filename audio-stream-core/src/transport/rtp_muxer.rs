use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::models::codec::{EncodedPacket, StreamParameters};
use crate::models::error::StreamError;
use crate::traits::packet_sink::PacketSink;
use crate::traits::transport::DatagramTransport;

use super::rtp::{self, MpaPacketizer, DEFAULT_MAX_DATAGRAM};
use super::sdp::SessionDescription;
use super::udp::{OutputUrl, UdpTransport};

/// Sample rates MPEG-1/2/2.5 Layer III can carry.
const MPEG_SAMPLE_RATES: [u32; 9] = [8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000];

/// Everything needed to open an output.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxerOptions {
    pub url: String,
    pub stream: StreamParameters,
    pub metadata: BTreeMap<String, String>,
    pub sdp_path: Option<PathBuf>,
    pub max_datagram: usize,
}

impl MuxerOptions {
    pub fn new(url: impl Into<String>, stream: StreamParameters) -> Self {
        Self {
            url: url.into(),
            stream,
            metadata: BTreeMap::new(),
            sdp_path: None,
            max_datagram: DEFAULT_MAX_DATAGRAM,
        }
    }
}

/// Single-stream RTP muxer for MPEG audio.
///
/// Opening writes the header (a session description, logged and optionally
/// saved to disk). Closing sends an RTCP BYE as the trailer and then releases
/// the transport whether or not the BYE went out.
pub struct RtpMuxer {
    url: String,
    transport: Option<Box<dyn DatagramTransport>>,
    packetizer: MpaPacketizer,
    session: SessionDescription,
    stream_index: usize,
    datagrams_sent: u64,
}

impl RtpMuxer {
    /// Open a UDP output at `options.url` (`rtp://host:port`).
    pub fn open(options: &MuxerOptions) -> Result<Self, StreamError> {
        let url = OutputUrl::parse(&options.url)?;
        if url.scheme != "rtp" {
            return Err(StreamError::TransportFormatNotFound(options.url.clone()));
        }

        allocate_stream(&options.stream)?;

        let open_failed = |e: std::io::Error| StreamError::TransportOpenFailed {
            url: options.url.clone(),
            reason: e.to_string(),
        };
        let destination = url.resolve().map_err(open_failed)?;
        let transport = UdpTransport::connect(destination).map_err(open_failed)?;

        Self::assemble(options, destination, Box::new(transport))
    }

    /// Open over a caller-supplied transport.
    pub fn with_transport(
        options: &MuxerOptions,
        destination: SocketAddr,
        transport: Box<dyn DatagramTransport>,
    ) -> Result<Self, StreamError> {
        allocate_stream(&options.stream)?;
        Self::assemble(options, destination, transport)
    }

    fn assemble(
        options: &MuxerOptions,
        destination: SocketAddr,
        transport: Box<dyn DatagramTransport>,
    ) -> Result<Self, StreamError> {
        let ids = uuid::Uuid::new_v4().as_u128();
        let ssrc = ids as u32;
        let initial_sequence = (ids >> 32) as u16;
        let base_timestamp = (ids >> 48) as u32;

        let packetizer = MpaPacketizer::new(ssrc, initial_sequence, base_timestamp, options.stream.sample_rate_hz)
            .with_max_datagram(options.max_datagram);

        let session = SessionDescription {
            session_id: (ids >> 64) as u64,
            session_version: chrono::Utc::now().timestamp().max(0) as u64,
            session_name: options
                .metadata
                .get("title")
                .cloned()
                .unwrap_or_else(|| "audio stream".to_string()),
            destination,
            channels: options.stream.channels,
            bitrate_bps: options.stream.bitrate_bps,
            metadata: options.metadata.clone(),
        };

        // The header goes out before the muxer owns the transport.
        write_header(&session, &options.url, options.sdp_path.as_deref())?;

        log::info!("RTP stream ready at {} (ssrc {:08x})", options.url, ssrc);
        Ok(Self {
            url: options.url.clone(),
            transport: Some(transport),
            packetizer,
            session,
            stream_index: 0,
            datagrams_sent: 0,
        })
    }

    /// The session description written as the header.
    pub fn sdp(&self) -> String {
        self.session.render()
    }

    pub fn ssrc(&self) -> u32 {
        self.packetizer.ssrc()
    }

    pub fn datagrams_sent(&self) -> u64 {
        self.datagrams_sent
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }
}

fn write_header(session: &SessionDescription, url: &str, sdp_path: Option<&Path>) -> Result<(), StreamError> {
    let sdp = session.render();
    log::info!("Session description for {}:\n{}", url, sdp);

    if let Some(path) = sdp_path {
        fs::write(path, &sdp).map_err(|e| {
            log::error!("Failed to write header to {}: {}", path.display(), e);
            StreamError::HeaderWriteFailed(format!("{}: {}", path.display(), e))
        })?;
    }
    Ok(())
}

/// Check that the RTP format can carry a stream with these parameters.
fn allocate_stream(params: &StreamParameters) -> Result<(), StreamError> {
    if !(1..=2).contains(&params.channels) {
        return Err(StreamError::StreamAllocationFailed(format!(
            "{} channels not supported by MPEG audio",
            params.channels
        )));
    }
    if !MPEG_SAMPLE_RATES.contains(&params.sample_rate_hz) {
        return Err(StreamError::StreamAllocationFailed(format!(
            "sample rate {} not supported by MPEG audio",
            params.sample_rate_hz
        )));
    }
    Ok(())
}

impl PacketSink for RtpMuxer {
    fn stream_index(&self) -> usize {
        self.stream_index
    }

    fn write_packet(&mut self, packet: &EncodedPacket) -> Result<(), StreamError> {
        if packet.stream_index != self.stream_index {
            return Err(StreamError::MuxFailed(format!(
                "unknown stream index {}",
                packet.stream_index
            )));
        }
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| StreamError::MuxFailed("output is closed".into()))?;

        for datagram in self.packetizer.packetize(&packet.data, packet.pts) {
            transport
                .send_media(&datagram)
                .map_err(|e| StreamError::MuxFailed(format!("send failed: {}", e)))?;
            self.datagrams_sent += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };

        let trailer = transport.send_control(&rtp::rtcp_bye(self.packetizer.ssrc()));
        drop(transport);
        log::info!("RTP stream at {} closed after {} datagrams", self.url, self.datagrams_sent);

        trailer.map(|_| ()).map_err(|e| {
            log::error!("Failed to write trailer for {}: {}", self.url, e);
            StreamError::TrailerWriteFailed(e.to_string())
        })
    }
}

impl Drop for RtpMuxer {
    fn drop(&mut self) {
        if self.transport.is_some() {
            let _ = self.close();
        }
    }
}
