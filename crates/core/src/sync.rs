//! Change notification and snapshot broadcasting.

use crate::command::CommandKind;
use crate::state::ProjectState;
use crossbeam_channel::{Receiver, Sender};
use saund_project::wire;
use saund_transport::{ClipId, TrackId, TrackParam};

/// Where a wholesale project replacement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

/// Emitted after every committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectEvent {
    TrackAdded(TrackId),
    TrackParamChanged { track_id: TrackId, param: TrackParam },
    ClipAdded { track_id: TrackId, clip_id: ClipId },
    ClipMoved { track_id: TrackId, clip_id: ClipId },
    Undone(CommandKind),
    Redone(CommandKind),
    SelectionChanged(Option<TrackId>),
    PositionChanged(f64),
    VolumeChanged(f64),
    TempoChanged(u32),
    Loaded(Origin),
}

impl ProjectEvent {
    pub fn origin(&self) -> Origin {
        match self {
            ProjectEvent::Loaded(origin) => *origin,
            _ => Origin::Local,
        }
    }
}

/// Receives every event together with the state it produced.
pub trait Subscriber: Send {
    fn notify(&mut self, event: &ProjectEvent, state: &ProjectState);
}

impl<F> Subscriber for F
where
    F: FnMut(&ProjectEvent, &ProjectState) + Send,
{
    fn notify(&mut self, event: &ProjectEvent, state: &ProjectState) {
        self(event, state)
    }
}

/// Transport for encoded snapshots.
pub trait SyncSink: Send {
    fn send(&mut self, payload: Vec<u8>) -> anyhow::Result<()>;
}

/// Publishes the full project snapshot after each local change.
pub struct Broadcaster<S> {
    sink: S,
}

impl<S: SyncSink> Broadcaster<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: SyncSink> Subscriber for Broadcaster<S> {
    fn notify(&mut self, event: &ProjectEvent, state: &ProjectState) {
        // Echoing a remote load back would ping-pong between peers
        if event.origin() == Origin::Remote {
            return;
        }

        let payload = match wire::encode(&state.snapshot()) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(?event, %err, "Failed to encode snapshot");
                return;
            }
        };

        if let Err(err) = self.sink.send(payload) {
            tracing::warn!(?event, err = %format!("{err:#}"), "Snapshot broadcast failed");
        }
    }
}

/// Sends snapshots over a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Vec<u8>>,
}

impl ChannelSink {
    pub fn new(tx: Sender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

impl SyncSink for ChannelSink {
    fn send(&mut self, payload: Vec<u8>) -> anyhow::Result<()> {
        self.tx
            .send(payload)
            .map_err(|_| anyhow::anyhow!("sync channel disconnected"))
    }
}

/// A broadcaster wired to a fresh unbounded channel, plus its receiving end.
pub fn channel_broadcaster() -> (Broadcaster<ChannelSink>, Receiver<Vec<u8>>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (Broadcaster::new(ChannelSink::new(tx)), rx)
}
