//! Hardware seams. The engine only drives these; implementations live with the host.

use saund_transport::TrackId;

/// Audio output that may need waking before playback (e.g. a suspended context).
pub trait OutputDevice: Send {
    fn resume(&mut self) -> anyhow::Result<()>;
}

/// Input capture. The captured audio comes back through `Session::finish_recording`.
pub trait Recorder: Send {
    fn start(&mut self) -> anyhow::Result<()>;
    fn stop(&mut self) -> anyhow::Result<()>;
}

/// A recording in progress: where its clip will land once finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordingTake {
    pub track_id: TrackId,
    pub start: f64,
}
