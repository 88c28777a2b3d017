//! MPEG audio Layer III frame boundaries.
//!
//! LAME hands back whatever bytes it has ready, which can be part of a frame
//! or several frames at once. [`FrameSplitter`] regroups that byte stream so
//! every packet carries exactly one frame.

/// Layer III bitrates in kbit/s by header index, MPEG-1.
const MPEG1_BITRATES: [u32; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];

/// Layer III bitrates in kbit/s by header index, MPEG-2 and 2.5.
const MPEG2_BITRATES: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

const HEADER_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

impl Version {
    fn sample_rates(self) -> [u32; 3] {
        match self {
            Self::Mpeg1 => [44100, 48000, 32000],
            Self::Mpeg2 => [22050, 24000, 16000],
            Self::Mpeg25 => [11025, 12000, 8000],
        }
    }
}

/// Length in bytes of the Layer III frame whose header starts `data`.
///
/// Returns `None` when `data` does not start with a valid Layer III header.
/// Free-format frames are not recognised.
pub fn layer3_frame_length(data: &[u8]) -> Option<usize> {
    let header = data.get(..HEADER_SIZE)?;
    if header[0] != 0xff || header[1] & 0xe0 != 0xe0 {
        return None;
    }

    let version = match (header[1] >> 3) & 0x03 {
        0 => Version::Mpeg25,
        2 => Version::Mpeg2,
        3 => Version::Mpeg1,
        _ => return None,
    };
    // Layer bits 01 = Layer III
    if (header[1] >> 1) & 0x03 != 0x01 {
        return None;
    }

    let bitrate_index = (header[2] >> 4) as usize;
    let rate_index = ((header[2] >> 2) & 0x03) as usize;
    let padding = ((header[2] >> 1) & 0x01) as usize;
    if bitrate_index == 0 || bitrate_index == 15 || rate_index == 3 {
        return None;
    }

    let (kbps, coefficient) = match version {
        Version::Mpeg1 => (MPEG1_BITRATES[bitrate_index], 144),
        Version::Mpeg2 | Version::Mpeg25 => (MPEG2_BITRATES[bitrate_index], 72),
    };
    let sample_rate = version.sample_rates()[rate_index];

    Some((coefficient * kbps * 1000 / sample_rate) as usize + padding)
}

/// Regroups an MP3 byte stream into whole frames.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    pending: Vec<u8>,
    discarded: u64,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.pending.extend_from_slice(data);
    }

    /// Take the next complete frame, skipping bytes that are not a header.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let sync = (0..self.pending.len()).find(|&i| layer3_frame_length(&self.pending[i..]).is_some());
        let Some(start) = sync else {
            // Keep a possible header prefix for the next push.
            let keep = self.pending.len().min(HEADER_SIZE - 1);
            self.skip(self.pending.len() - keep);
            return None;
        };
        self.skip(start);

        let length = layer3_frame_length(&self.pending)?;
        if self.pending.len() < length {
            return None;
        }
        Some(self.pending.drain(..length).collect())
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Total bytes dropped while looking for a frame header.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Drop whatever partial frame is still held.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.skip(dropped);
        dropped
    }

    fn skip(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        log::warn!("Skipping {} bytes outside MPEG audio frames", count);
        self.pending.drain(..count);
        self.discarded += count as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A Layer III frame with a valid header and zero body.
    fn frame(header: [u8; 4]) -> Vec<u8> {
        let mut frame = vec![0u8; layer3_frame_length(&header).unwrap()];
        frame[..4].copy_from_slice(&header);
        frame
    }

    // MPEG-1, 128 kbit/s, 44.1 kHz
    const MPEG1_128K: [u8; 4] = [0xff, 0xfb, 0x90, 0x64];
    // MPEG-2, 64 kbit/s, 22.05 kHz
    const MPEG2_64K: [u8; 4] = [0xff, 0xf3, 0x80, 0xc4];

    #[test]
    fn header_lengths() {
        assert_eq!(layer3_frame_length(&MPEG1_128K), Some(417));
        assert_eq!(layer3_frame_length(&[0xff, 0xfb, 0x92, 0x64]), Some(418));
        assert_eq!(layer3_frame_length(&MPEG2_64K), Some(208));
        // MPEG-1, 64 kbit/s, 48 kHz
        assert_eq!(layer3_frame_length(&[0xff, 0xfb, 0x54, 0x00]), Some(192));
    }

    #[test]
    fn invalid_headers_are_rejected() {
        assert_eq!(layer3_frame_length(&[0xff, 0xfb, 0x90]), None);
        assert_eq!(layer3_frame_length(&[0x00, 0xfb, 0x90, 0x64]), None);
        // Layer II
        assert_eq!(layer3_frame_length(&[0xff, 0xfd, 0x90, 0x64]), None);
        // Reserved version
        assert_eq!(layer3_frame_length(&[0xff, 0xeb, 0x90, 0x64]), None);
        // Free format and bad bitrate index
        assert_eq!(layer3_frame_length(&[0xff, 0xfb, 0x00, 0x64]), None);
        assert_eq!(layer3_frame_length(&[0xff, 0xfb, 0xf0, 0x64]), None);
        // Reserved sample rate
        assert_eq!(layer3_frame_length(&[0xff, 0xfb, 0x9c, 0x64]), None);
    }

    #[test]
    fn frames_split_across_pushes() {
        let first = frame(MPEG1_128K);
        let second = frame(MPEG1_128K);
        let stream: Vec<u8> = first.iter().chain(second.iter()).copied().collect();

        let mut splitter = FrameSplitter::new();
        splitter.push(&stream[..100]);
        assert_eq!(splitter.next_frame(), None);
        splitter.push(&stream[100..600]);
        assert_eq!(splitter.next_frame(), Some(first));
        assert_eq!(splitter.next_frame(), None);
        assert_eq!(splitter.buffered(), 600 - 417);

        splitter.push(&stream[600..]);
        assert_eq!(splitter.next_frame(), Some(second));
        assert_eq!(splitter.buffered(), 0);
        assert_eq!(splitter.discarded(), 0);
    }

    #[test]
    fn several_frames_in_one_push() {
        let mut splitter = FrameSplitter::new();
        for _ in 0..3 {
            splitter.push(&frame(MPEG2_64K));
        }
        let mut count = 0;
        while let Some(f) = splitter.next_frame() {
            assert_eq!(f.len(), 208);
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn resyncs_after_junk() {
        let mut splitter = FrameSplitter::new();
        splitter.push(&[0x12, 0xff, 0x00, 0x34, 0x56]);
        splitter.push(&frame(MPEG2_64K));

        assert_eq!(splitter.next_frame(), Some(frame(MPEG2_64K)));
        assert_eq!(splitter.discarded(), 5);
    }

    #[test]
    fn header_prefix_is_kept_until_complete() {
        let mut splitter = FrameSplitter::new();
        splitter.push(&[0x00, 0x00, 0xff, 0xfb]);
        assert_eq!(splitter.next_frame(), None);
        assert_eq!(splitter.buffered(), 3);

        let rest = frame(MPEG1_128K);
        splitter.push(&rest[2..]);
        assert_eq!(splitter.next_frame(), Some(rest));
        assert_eq!(splitter.clear(), 0);
    }
}
