use std::path::Path;

use crate::clip_ops;
use crate::clock::{PlaybackClock, PlaybackState};
use crate::command::Command;
use crate::config::EngineConfig;
use crate::device::{OutputDevice, Recorder, RecordingTake};
use crate::error::{EngineError, Result};
use crate::history::History;
use crate::state::ProjectState;
use crate::sync::{Origin, ProjectEvent, Subscriber};
use crate::time::{MusicalPosition, TimeContext, format_time};
use saund_project::{Snapshot, from_json, load_project, save_project, to_json, wire};
use saund_transport::{
    AudioArc, Clip, ClipId, LEVEL_RANGE, Track, TrackColor, TrackId, TrackParam, clamp_to_range,
};

/// One open project and everything that edits, plays and publishes it.
pub struct Session {
    state: ProjectState,
    history: History,
    clock: PlaybackClock,
    config: EngineConfig,
    subscribers: Vec<Box<dyn Subscriber>>,
    output: Option<Box<dyn OutputDevice>>,
    recorder: Option<Box<dyn Recorder>>,
    recording: Option<RecordingTake>,
    next_id: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: ProjectState::new(
                clamp_to_range(config.default_volume, LEVEL_RANGE),
                config.default_bpm,
            ),
            history: History::new(config.history_limit),
            clock: PlaybackClock::new(config.tick_step_secs),
            config,
            subscribers: Vec::new(),
            output: None,
            recorder: None,
            recording: None,
            next_id: 1,
        }
    }

    /// Open a project file (JSON, or MessagePack as a fallback).
    pub fn open(path: &Path, config: EngineConfig) -> Result<Self> {
        let snapshot = load_project(path)?;
        let mut session = Self::new(config);
        session.replace_project(snapshot, Origin::Local)?;
        Ok(session)
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn set_output_device(&mut self, device: impl OutputDevice + 'static) {
        self.output = Some(Box::new(device));
    }

    pub fn set_recorder(&mut self, recorder: impl Recorder + 'static) {
        self.recorder = Some(Box::new(recorder));
    }

    // Accessors

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    pub fn tracks(&self) -> &[Track] {
        self.state.tracks()
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.state.track(id)
    }

    pub fn selected_track(&self) -> Option<TrackId> {
        self.state.selected_track()
    }

    pub fn volume(&self) -> f64 {
        self.state.volume()
    }

    pub fn bpm(&self) -> u32 {
        self.state.bpm()
    }

    pub fn duration(&self) -> f64 {
        self.state.duration()
    }

    pub fn current_time(&self) -> f64 {
        self.clock.position()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.clock.state()
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn recording(&self) -> Option<RecordingTake> {
        self.recording
    }

    /// Track type names offered for the configured project type.
    pub fn track_types(&self) -> &'static [&'static str] {
        self.config.project_type.track_types()
    }

    pub fn time_context(&self) -> TimeContext {
        TimeContext::new(f64::from(self.state.bpm()))
    }

    /// `"mm:ss.cc / mm:ss.cc"`: position over duration.
    pub fn position_label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.current_time()),
            format_time(self.duration())
        )
    }

    pub fn musical_position(&self) -> MusicalPosition {
        self.time_context().format_position(self.current_time())
    }

    // Undoable edits

    pub fn add_track(&mut self, kind: &str) -> TrackId {
        let count = self.state.tracks().len();
        let id = TrackId(self.allocate_id());
        let mut track = Track::new(
            id,
            format!("{kind} {}", count + 1),
            kind.to_string(),
            TrackColor::from_index(count),
        );
        track.volume = clamp_to_range(self.config.default_volume, LEVEL_RANGE);

        self.state.insert_track(count, track.clone());
        self.record(Command::AddTrack { track, index: count });
        id
    }

    pub fn update_track_effect(
        &mut self,
        track_id: TrackId,
        param: TrackParam,
        value: f64,
    ) -> Result<()> {
        let track = self
            .state
            .track(track_id)
            .ok_or(EngineError::TrackNotFound(track_id))?;
        let old_value = track.param(param);

        self.commit(Command::UpdateTrackEffect {
            track_id,
            param,
            old_value,
            new_value: param.clamp(value),
        })
    }

    pub fn add_clip(
        &mut self,
        track_id: TrackId,
        start: f64,
        end: f64,
        audio: AudioArc,
    ) -> Result<ClipId> {
        clip_ops::validate_range(start, end)?;
        if self.state.track(track_id).is_none() {
            return Err(EngineError::TrackNotFound(track_id));
        }

        let id = ClipId(self.allocate_id());
        self.commit(Command::AddClip {
            track_id,
            clip: Clip {
                id,
                start,
                end,
                audio,
            },
        })?;
        Ok(id)
    }

    /// Shift a clip to `new_start` (clamped to 0), keeping its length.
    pub fn move_clip(&mut self, track_id: TrackId, clip_id: ClipId, new_start: f64) -> Result<()> {
        let clip = self
            .state
            .track(track_id)
            .ok_or(EngineError::TrackNotFound(track_id))?
            .clip(clip_id)
            .ok_or(EngineError::ClipNotFound {
                track: track_id,
                clip: clip_id,
            })?;

        let length = clip.duration();
        if !new_start.is_finite() {
            return Err(EngineError::InvalidRange {
                start: new_start,
                end: new_start + length,
            });
        }

        let start = clip_ops::clamp_start(new_start);
        let command = Command::MoveClip {
            track_id,
            clip_id,
            from: (clip.start, clip.end),
            to: (start, start + length),
        };
        self.commit(command)
    }

    pub fn undo(&mut self) -> Result<bool> {
        match self.history.undo(&mut self.state)? {
            Some(kind) => {
                self.settle_transients();
                self.emit(ProjectEvent::Undone(kind));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> Result<bool> {
        match self.history.redo(&mut self.state)? {
            Some(kind) => {
                self.settle_transients();
                self.emit(ProjectEvent::Redone(kind));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // Transient setters, not recorded in history

    pub fn set_selected_track(&mut self, track_id: Option<TrackId>) -> Result<()> {
        self.state.set_selected_track(track_id)?;
        self.emit(ProjectEvent::SelectionChanged(track_id));
        Ok(())
    }

    pub fn set_current_time(&mut self, seconds: f64) {
        self.clock.seek(seconds, self.state.duration());
        self.emit(ProjectEvent::PositionChanged(self.clock.position()));
    }

    pub fn skip_backward(&mut self) {
        self.set_current_time(self.current_time() - self.config.skip_secs);
    }

    pub fn skip_forward(&mut self) {
        self.set_current_time(self.current_time() + self.config.skip_secs);
    }

    pub fn set_volume(&mut self, volume: f64) {
        let volume = clamp_to_range(volume, LEVEL_RANGE);
        self.state.set_volume(volume);
        self.emit(ProjectEvent::VolumeChanged(volume));
    }

    pub fn set_bpm(&mut self, bpm: u32) {
        self.state.set_bpm(bpm);
        self.emit(ProjectEvent::TempoChanged(self.state.bpm()));
    }

    // Playback

    /// Start playback, waking the output device first.
    pub fn play(&mut self) -> Result<()> {
        if self.clock.is_playing() {
            return Ok(());
        }

        if let Some(output) = self.output.as_mut() {
            output
                .resume()
                .map_err(|err| EngineError::DeviceUnavailable(format!("{err:#}")))?;
        }

        self.clock.play();
        tracing::debug!(position = self.clock.position(), "Playback started");
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.clock.is_playing() {
            self.clock.pause();
            tracing::debug!(position = self.clock.position(), "Playback paused");
        }
    }

    pub fn toggle_playback(&mut self) -> Result<PlaybackState> {
        if self.clock.is_playing() {
            self.pause();
        } else {
            self.play()?;
        }
        Ok(self.clock.state())
    }

    pub fn stop(&mut self) {
        self.clock.stop();
        tracing::debug!("Playback stopped");
    }

    /// Advance the clock one step. Called by the driver on every interval.
    pub fn tick(&mut self) -> PlaybackState {
        self.clock.tick(self.state.duration())
    }

    // Recording

    pub fn start_recording(&mut self, track_id: TrackId) -> Result<()> {
        if self.state.track(track_id).is_none() {
            return Err(EngineError::TrackNotFound(track_id));
        }

        if let Some(recorder) = self.recorder.as_mut() {
            recorder
                .start()
                .map_err(|err| EngineError::DeviceUnavailable(format!("{err:#}")))?;
        }

        let take = RecordingTake {
            track_id,
            start: self.clock.position(),
        };
        tracing::debug!(track = %track_id, start = take.start, "Recording started");
        self.recording = Some(take);
        Ok(())
    }

    /// Stop capturing. The take stays pending until [`Session::finish_recording`].
    pub fn stop_recording(&mut self) -> Result<()> {
        if self.recording.is_none() {
            return Err(EngineError::NoActiveRecording);
        }

        if let Some(recorder) = self.recorder.as_mut() {
            recorder
                .stop()
                .map_err(|err| EngineError::DeviceUnavailable(format!("{err:#}")))?;
        }
        tracing::debug!("Recording stopped");
        Ok(())
    }

    /// Commit captured audio as a clip at the take's start.
    pub fn finish_recording(&mut self, audio: AudioArc) -> Result<ClipId> {
        let take = self.recording.ok_or(EngineError::NoActiveRecording)?;
        let end = take.start + audio.duration_secs();
        let clip_id = self.add_clip(take.track_id, take.start, end, audio)?;
        self.recording = None;
        Ok(clip_id)
    }

    /// Decode an audio file and place it at the current position.
    pub fn import_clip(&mut self, track_id: TrackId, path: &Path) -> Result<ClipId> {
        if self.state.track(track_id).is_none() {
            return Err(EngineError::TrackNotFound(track_id));
        }

        let audio = saund_decode::decode_file(path).map_err(|source| EngineError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let start = self.clock.position();
        let end = start + audio.duration_secs();
        self.add_clip(track_id, start, end, audio)
    }

    // Persistence and sync

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn save(&self) -> Result<String> {
        Ok(to_json(&self.snapshot())?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        save_project(path, &self.snapshot())?;
        Ok(())
    }

    pub fn load(&mut self, text: &str) -> Result<()> {
        let snapshot = from_json(text)?;
        self.replace_project(snapshot, Origin::Local)
    }

    /// Apply a snapshot received from a peer. Malformed payloads leave the
    /// session untouched.
    pub fn on_remote_update(&mut self, payload: &[u8]) -> Result<()> {
        let snapshot = wire::decode(payload).inspect_err(|err| {
            tracing::warn!(%err, bytes = payload.len(), "Rejected remote snapshot");
        })?;
        self.replace_project(snapshot, Origin::Remote)
    }

    fn replace_project(&mut self, snapshot: Snapshot, origin: Origin) -> Result<()> {
        let max_id = snapshot.max_id();
        let bpm = snapshot.bpm;
        let volume = clamp_to_range(snapshot.volume, LEVEL_RANGE);
        // Validates everything before the current state is touched
        let tracks = snapshot.into_tracks()?;

        self.state.replace(tracks, bpm, volume);
        self.history.clear();
        self.settle_transients();
        // Validation keeps every id below u64::MAX
        if let Some(max) = max_id {
            self.next_id = self.next_id.max(max + 1);
        }

        tracing::debug!(
            ?origin,
            tracks = self.state.tracks().len(),
            duration = self.state.duration(),
            "Project replaced"
        );
        self.emit(ProjectEvent::Loaded(origin));
        Ok(())
    }

    /// Pull the play position and any pending take back in line after the
    /// track set changed underneath them.
    fn settle_transients(&mut self) {
        self.clock.clamp_to(self.state.duration());
        if let Some(take) = self.recording {
            if self.state.track(take.track_id).is_none() {
                tracing::debug!(track = %take.track_id, "Dropping recording take for removed track");
                self.recording = None;
            }
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn commit(&mut self, command: Command) -> Result<()> {
        command.apply(&mut self.state)?;
        self.record(command);
        Ok(())
    }

    /// Log, record and announce a command that has already been applied.
    fn record(&mut self, command: Command) {
        let event = match &command {
            Command::AddTrack { track, .. } => ProjectEvent::TrackAdded(track.id),
            Command::UpdateTrackEffect {
                track_id, param, ..
            } => ProjectEvent::TrackParamChanged {
                track_id: *track_id,
                param: *param,
            },
            Command::AddClip { track_id, clip } => ProjectEvent::ClipAdded {
                track_id: *track_id,
                clip_id: clip.id,
            },
            Command::MoveClip {
                track_id, clip_id, ..
            } => ProjectEvent::ClipMoved {
                track_id: *track_id,
                clip_id: *clip_id,
            },
        };

        tracing::debug!(
            command = command.name(),
            duration = self.state.duration(),
            "Committed"
        );
        self.history.record(command);
        self.emit(event);
    }

    fn emit(&mut self, event: ProjectEvent) {
        for subscriber in &mut self.subscribers {
            subscriber.notify(&event, &self.state);
        }
    }
}
