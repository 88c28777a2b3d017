use std::io;

/// Datagram transport carrying media and control packets to a remote peer.
pub trait DatagramTransport: Send {
    /// Send one media datagram.
    fn send_media(&mut self, datagram: &[u8]) -> io::Result<usize>;

    /// Send one control datagram (e.g. RTCP).
    fn send_control(&mut self, datagram: &[u8]) -> io::Result<usize>;
}
