pub mod rtp;
pub mod rtp_muxer;
pub mod sdp;
pub mod udp;
