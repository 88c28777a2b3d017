/// Pipeline lifecycle state machine.
///
/// Configuration happens in [`Pipeline::configure`](crate::Pipeline::configure);
/// a pipeline value only exists once its encoder thread is running.
///
/// State transitions:
/// ```text
/// running → stopping → closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Stopping,
    Closed,
}

impl PipelineState {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether producers may still push audio.
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Encoder state machine.
///
/// ```text
/// idle → encoding → draining → closed
///   └──────────────────↗
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    Idle,
    Encoding,
    Draining,
    Closed,
}

impl EncoderState {
    pub fn accepts_frames(&self) -> bool {
        matches!(self, Self::Idle | Self::Encoding)
    }
}

/// Counters kept by the processing thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineDiagnostics {
    pub bytes_written: u64,
    pub frames_submitted: u64,
    pub frames_dropped: u64,
    pub packets_muxed: u64,
    pub mux_errors: u64,
    pub last_pts: Option<i64>,
}
