use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::net::{IpAddr, SocketAddr};

use super::rtp::{MPA_CLOCK_RATE, MPA_PAYLOAD_TYPE};

/// Session description announcing an RTP audio stream (RFC 4566).
///
/// Acts as the stream header: clients such as `ffplay` open the `.sdp` file
/// to learn the endpoint and payload format. Metadata tags are carried as
/// session-level attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub session_id: u64,
    pub session_version: u64,
    pub session_name: String,
    pub destination: SocketAddr,
    pub channels: u8,
    pub bitrate_bps: u32,
    pub metadata: BTreeMap<String, String>,
}

impl SessionDescription {
    pub fn render(&self) -> String {
        let ip = self.destination.ip();
        let family = match ip {
            IpAddr::V4(_) => "IP4",
            IpAddr::V6(_) => "IP6",
        };

        let mut sdp = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(sdp, "v=0");
        let _ = writeln!(
            sdp,
            "o=- {} {} IN {} {}",
            self.session_id, self.session_version, family, ip
        );
        let _ = writeln!(sdp, "s={}", sanitize(&self.session_name));
        let _ = writeln!(sdp, "c=IN {} {}", family, ip);
        let _ = writeln!(sdp, "t=0 0");
        let _ = writeln!(sdp, "a=tool:audio-stream");
        for (key, value) in &self.metadata {
            let _ = writeln!(sdp, "a={}:{}", sanitize(key), sanitize(value));
        }
        let _ = writeln!(sdp, "m=audio {} RTP/AVP {}", self.destination.port(), MPA_PAYLOAD_TYPE);
        let _ = writeln!(sdp, "b=AS:{}", self.bitrate_bps / 1000);
        let _ = writeln!(
            sdp,
            "a=rtpmap:{} MPA/{}/{}",
            MPA_PAYLOAD_TYPE, MPA_CLOCK_RATE, self.channels
        );
        sdp
    }
}

/// Strip characters that would break the line-oriented format.
fn sanitize(value: &str) -> String {
    value.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}
