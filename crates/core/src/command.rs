//! Undoable mutations as plain data.
//!
//! Each variant carries everything needed to apply and revert itself, so undo
//! never has to recompute anything from the surrounding state.

use crate::error::Result;
use crate::state::ProjectState;
use saund_transport::{Clip, ClipId, Track, TrackId, TrackParam};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddTrack {
        track: Track,
        index: usize,
    },
    UpdateTrackEffect {
        track_id: TrackId,
        param: TrackParam,
        old_value: f64,
        new_value: f64,
    },
    AddClip {
        track_id: TrackId,
        clip: Clip,
    },
    MoveClip {
        track_id: TrackId,
        clip_id: ClipId,
        /// `(start, end)` before the move
        from: (f64, f64),
        /// `(start, end)` after the move
        to: (f64, f64),
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    AddTrack,
    UpdateTrackEffect,
    AddClip,
    MoveClip,
}

impl CommandKind {
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::AddTrack => "Add track",
            CommandKind::UpdateTrackEffect => "Update track effect",
            CommandKind::AddClip => "Add clip",
            CommandKind::MoveClip => "Move clip",
        }
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::AddTrack { .. } => CommandKind::AddTrack,
            Command::UpdateTrackEffect { .. } => CommandKind::UpdateTrackEffect,
            Command::AddClip { .. } => CommandKind::AddClip,
            Command::MoveClip { .. } => CommandKind::MoveClip,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Perform the forward effect.
    pub fn apply(&self, state: &mut ProjectState) -> Result<()> {
        match self {
            Command::AddTrack { track, index } => {
                state.insert_track(*index, track.clone());
                Ok(())
            }
            Command::UpdateTrackEffect {
                track_id,
                param,
                new_value,
                ..
            } => state.set_track_param(*track_id, *param, *new_value),
            Command::AddClip { track_id, clip } => state.push_clip(*track_id, clip.clone()),
            Command::MoveClip {
                track_id,
                clip_id,
                to,
                ..
            } => state.place_clip(*track_id, *clip_id, *to),
        }
    }

    /// Undo the forward effect, restoring the captured pre-mutation values.
    pub fn revert(&self, state: &mut ProjectState) -> Result<()> {
        match self {
            Command::AddTrack { track, .. } => state.remove_track(track.id).map(|_| ()),
            Command::UpdateTrackEffect {
                track_id,
                param,
                old_value,
                ..
            } => state.set_track_param(*track_id, *param, *old_value),
            Command::AddClip { track_id, clip } => state.remove_clip(*track_id, clip.id).map(|_| ()),
            Command::MoveClip {
                track_id,
                clip_id,
                from,
                ..
            } => state.place_clip(*track_id, *clip_id, *from),
        }
    }
}
