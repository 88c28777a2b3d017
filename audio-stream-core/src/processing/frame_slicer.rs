use std::time::Duration;

use super::capture_buffer::CaptureBuffer;

/// Cuts the capture buffer into whole codec frames.
///
/// The frame size is fixed when the pipeline is configured. A slice is only
/// taken once a full frame is staged; trailing partial frames stay behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSlicer {
    frame_size: usize,
}

impl FrameSlicer {
    pub fn new(frame_size: usize) -> Self {
        Self { frame_size }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Take one frame into `frame` if a whole frame is staged.
    pub fn next_frame(&self, buffer: &CaptureBuffer, frame: &mut [u8]) -> bool {
        debug_assert_eq!(frame.len(), self.frame_size);
        buffer.take(frame)
    }

    /// Like [`next_frame`](Self::next_frame), waiting up to `timeout` for data.
    pub fn wait_next_frame(&self, buffer: &CaptureBuffer, frame: &mut [u8], timeout: Duration) -> bool {
        debug_assert_eq!(frame.len(), self.frame_size);
        buffer.wait_take(frame, timeout)
    }

    /// Number of whole frames in `bytes` bytes of input.
    pub fn frames_in(&self, bytes: usize) -> usize {
        bytes / self.frame_size
    }
}
