pub mod clip_ops;
pub mod clock;
pub mod command;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod history;
pub mod session;
pub mod state;
pub mod sync;
pub mod time;

pub use clock::{PlaybackClock, PlaybackState};
pub use command::{Command, CommandKind};
pub use config::EngineConfig;
pub use device::{OutputDevice, Recorder, RecordingTake};
pub use driver::ClockDriver;
pub use error::{EngineError, Result};
pub use history::History;
pub use session::Session;
pub use state::ProjectState;
pub use sync::{Broadcaster, ChannelSink, Origin, ProjectEvent, Subscriber, SyncSink, channel_broadcaster};
pub use time::{MusicalPosition, TimeContext, format_time};

pub use saund_decode::decode_file;
pub use saund_project::{ProjectError, ProjectMetadata, Snapshot, load_project_metadata};
pub use saund_transport::{
    AudioArc, Clip, ClipId, EffectField, EffectSettings, ProjectType, Track, TrackColor, TrackId,
    TrackParam,
};
