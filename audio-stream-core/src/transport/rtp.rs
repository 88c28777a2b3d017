//! RTP packetization for MPEG audio (RFC 3550, RFC 2250).
//!
//! Packet layout:
//! ```text
//! [0]      V=2 | P | X | CC
//! [1]      M | payload type
//! [2-3]    sequence number (BE)
//! [4-7]    timestamp (BE)
//! [8-11]   SSRC (BE)
//! [12-13]  MBZ (MPA header)
//! [14-15]  fragment offset (MPA header)
//! [16..]   MPEG audio frames
//! ```

/// Size of the fixed RTP header without CSRCs.
pub const RTP_HEADER_SIZE: usize = 12;

/// Size of the RFC 2250 MPEG audio-specific header.
pub const MPA_HEADER_SIZE: usize = 4;

/// Static payload type for MPEG audio.
pub const MPA_PAYLOAD_TYPE: u8 = 14;

/// RTP clock rate for MPEG audio, independent of the sample rate.
pub const MPA_CLOCK_RATE: u32 = 90_000;

/// Default datagram budget, leaving room for IP/UDP headers on a 1500-byte MTU.
pub const DEFAULT_MAX_DATAGRAM: usize = 1400;

const RTP_VERSION: u8 = 2;
const RTCP_BYE: u8 = 203;

/// Fields of a fixed RTP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub marker: bool,
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

impl RtpHeader {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(RTP_VERSION << 6);
        out.push(((self.marker as u8) << 7) | (self.payload_type & 0x7f));
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.ssrc.to_be_bytes());
    }

    /// Parse the fixed header at the start of `datagram`.
    pub fn parse(datagram: &[u8]) -> Option<Self> {
        if datagram.len() < RTP_HEADER_SIZE || datagram[0] >> 6 != RTP_VERSION {
            return None;
        }
        Some(Self {
            marker: datagram[1] & 0x80 != 0,
            payload_type: datagram[1] & 0x7f,
            sequence: u16::from_be_bytes([datagram[2], datagram[3]]),
            timestamp: u32::from_be_bytes([datagram[4], datagram[5], datagram[6], datagram[7]]),
            ssrc: u32::from_be_bytes([datagram[8], datagram[9], datagram[10], datagram[11]]),
        })
    }
}

/// Splits encoded MPEG audio into RTP datagrams.
#[derive(Debug, Clone)]
pub struct MpaPacketizer {
    ssrc: u32,
    next_sequence: u16,
    base_timestamp: u32,
    sample_rate_hz: u32,
    max_datagram: usize,
}

impl MpaPacketizer {
    pub fn new(ssrc: u32, initial_sequence: u16, base_timestamp: u32, sample_rate_hz: u32) -> Self {
        Self {
            ssrc,
            next_sequence: initial_sequence,
            base_timestamp,
            sample_rate_hz,
            max_datagram: DEFAULT_MAX_DATAGRAM,
        }
    }

    pub fn with_max_datagram(mut self, max_datagram: usize) -> Self {
        self.max_datagram = max_datagram.max(RTP_HEADER_SIZE + MPA_HEADER_SIZE + 1);
        self
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn next_sequence(&self) -> u16 {
        self.next_sequence
    }

    /// Convert a pts in `1/sample_rate` units to the 90 kHz RTP clock.
    pub fn rtp_timestamp(&self, pts: i64) -> u32 {
        let ticks = (pts as i128 * MPA_CLOCK_RATE as i128) / self.sample_rate_hz as i128;
        self.base_timestamp.wrapping_add(ticks as u32)
    }

    /// Packetize one encoded payload. Payloads larger than one datagram are
    /// fragmented; every fragment shares the timestamp and carries its offset.
    pub fn packetize(&mut self, payload: &[u8], pts: i64) -> Vec<Vec<u8>> {
        let timestamp = self.rtp_timestamp(pts);
        let chunk = self.max_datagram - RTP_HEADER_SIZE - MPA_HEADER_SIZE;

        payload
            .chunks(chunk)
            .enumerate()
            .map(|(i, fragment)| {
                let offset = (i * chunk).min(u16::MAX as usize) as u16;
                let header = RtpHeader {
                    marker: false,
                    payload_type: MPA_PAYLOAD_TYPE,
                    sequence: self.next_sequence,
                    timestamp,
                    ssrc: self.ssrc,
                };
                self.next_sequence = self.next_sequence.wrapping_add(1);

                let mut datagram = Vec::with_capacity(RTP_HEADER_SIZE + MPA_HEADER_SIZE + fragment.len());
                header.write_to(&mut datagram);
                datagram.extend_from_slice(&0u16.to_be_bytes());
                datagram.extend_from_slice(&offset.to_be_bytes());
                datagram.extend_from_slice(fragment);
                datagram
            })
            .collect()
    }
}

/// Build an RTCP BYE packet announcing that `ssrc` leaves the session.
pub fn rtcp_bye(ssrc: u32) -> [u8; 8] {
    let mut packet = [0u8; 8];
    packet[0] = (RTP_VERSION << 6) | 1; // one source
    packet[1] = RTCP_BYE;
    packet[2..4].copy_from_slice(&1u16.to_be_bytes()); // length in words minus one
    packet[4..8].copy_from_slice(&ssrc.to_be_bytes());
    packet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let mut out = Vec::new();
        RtpHeader {
            marker: true,
            payload_type: MPA_PAYLOAD_TYPE,
            sequence: 0x1234,
            timestamp: 0xdeadbeef,
            ssrc: 0x01020304,
        }
        .write_to(&mut out);

        assert_eq!(out.len(), RTP_HEADER_SIZE);
        assert_eq!(out[0], 0x80);
        assert_eq!(out[1], 0x80 | 14);
        assert_eq!(&out[2..4], &[0x12, 0x34]);
        assert_eq!(&out[4..8], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&out[8..12], &[1, 2, 3, 4]);

        let parsed = RtpHeader::parse(&out).unwrap();
        assert!(parsed.marker);
        assert_eq!(parsed.sequence, 0x1234);
    }

    #[test]
    fn parse_rejects_short_or_foreign() {
        assert!(RtpHeader::parse(&[0x80; 11]).is_none());
        assert!(RtpHeader::parse(&[0x40; 12]).is_none());
    }

    #[test]
    fn small_payload_is_one_datagram() {
        let mut p = MpaPacketizer::new(7, 100, 0, 44100);
        let datagrams = p.packetize(&[0xff; 200], 0);
        assert_eq!(datagrams.len(), 1);
        assert_eq!(datagrams[0].len(), RTP_HEADER_SIZE + MPA_HEADER_SIZE + 200);
        // MBZ and zero fragment offset
        assert_eq!(&datagrams[0][12..16], &[0, 0, 0, 0]);
        assert_eq!(p.next_sequence(), 101);
    }

    #[test]
    fn large_payload_is_fragmented_with_offsets() {
        let mut p = MpaPacketizer::new(7, 0, 0, 44100).with_max_datagram(116);
        let datagrams = p.packetize(&[1; 250], 1152);
        // 100 payload bytes per datagram
        assert_eq!(datagrams.len(), 3);

        let offsets: Vec<u16> = datagrams
            .iter()
            .map(|d| u16::from_be_bytes([d[14], d[15]]))
            .collect();
        assert_eq!(offsets, vec![0, 100, 200]);

        let timestamps: Vec<u32> = datagrams
            .iter()
            .map(|d| RtpHeader::parse(d).unwrap().timestamp)
            .collect();
        assert!(timestamps.iter().all(|&t| t == timestamps[0]));

        let sequences: Vec<u16> = datagrams
            .iter()
            .map(|d| RtpHeader::parse(d).unwrap().sequence)
            .collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[test]
    fn sequence_wraps() {
        let mut p = MpaPacketizer::new(1, u16::MAX, 0, 48000);
        let a = p.packetize(&[0; 10], 0);
        let b = p.packetize(&[0; 10], 1152);
        assert_eq!(RtpHeader::parse(&a[0]).unwrap().sequence, u16::MAX);
        assert_eq!(RtpHeader::parse(&b[0]).unwrap().sequence, 0);
    }

    #[test]
    fn timestamps_use_90khz_clock() {
        let p = MpaPacketizer::new(1, 0, 1000, 48000);
        assert_eq!(p.rtp_timestamp(0), 1000);
        // 1152 samples at 48 kHz = 24 ms = 2160 ticks
        assert_eq!(p.rtp_timestamp(1152), 1000 + 2160);

        let wrapping = MpaPacketizer::new(1, 0, u32::MAX, 48000);
        assert_eq!(wrapping.rtp_timestamp(1152), 2159);
    }

    #[test]
    fn bye_layout() {
        let bye = rtcp_bye(0xaabbccdd);
        assert_eq!(bye, [0x81, 203, 0, 1, 0xaa, 0xbb, 0xcc, 0xdd]);
    }
}
