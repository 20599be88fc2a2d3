//! Serializable projection of the project: `{ tracks, bpm, volume }`.
//!
//! The same [`Snapshot`] shape is written to disk as JSON, returned by
//! `save()` as text, and broadcast to collaborators in MessagePack form (see
//! [`wire`]). Transient state (play position, selection) is not part of it.

mod load;
mod save;
pub mod wire;

use saund_transport::{
    AudioArc, Clip, ClipId, EffectSettings, LEVEL_RANGE, Track, TrackColor, TrackId, clamp_to_range,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

pub use load::{ProjectMetadata, from_json, load_project, load_project_metadata};
pub use save::{save_project, to_json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub tracks: Vec<TrackData>,
    pub bpm: u32,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackData {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
    pub volume: f64,
    pub effects: EffectData,
    pub clips: Vec<ClipData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectData {
    pub pre_gain: f64,
    pub clarity: f64,
    pub pan: f64,
    pub reverb: f64,
    pub delay: f64,
    pub compression: f64,
    pub eq: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipData {
    pub id: u64,
    pub start: f64,
    pub end: f64,
    pub audio: AudioData,
}

/// Decoded audio carried inline so a snapshot is self-contained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioData {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}

impl From<&EffectSettings> for EffectData {
    fn from(effects: &EffectSettings) -> Self {
        Self {
            pre_gain: effects.pre_gain,
            clarity: effects.clarity,
            pan: effects.pan,
            reverb: effects.reverb,
            delay: effects.delay,
            compression: effects.compression,
            eq: effects.eq,
        }
    }
}

impl From<EffectData> for EffectSettings {
    fn from(data: EffectData) -> Self {
        Self {
            pre_gain: data.pre_gain,
            clarity: data.clarity,
            pan: data.pan,
            reverb: data.reverb,
            delay: data.delay,
            compression: data.compression,
            eq: data.eq,
        }
    }
}

impl From<&AudioArc> for AudioData {
    fn from(audio: &AudioArc) -> Self {
        Self {
            sample_rate: audio.sample_rate(),
            channels: audio.channels(),
            samples: audio.samples().to_vec(),
        }
    }
}

impl From<&Track> for TrackData {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.0,
            name: track.name.clone(),
            kind: track.kind.clone(),
            color: track.color.name().to_string(),
            volume: track.volume,
            effects: EffectData::from(&track.effects),
            clips: track
                .clips()
                .iter()
                .map(|clip| ClipData {
                    id: clip.id.0,
                    start: clip.start,
                    end: clip.end,
                    audio: AudioData::from(&clip.audio),
                })
                .collect(),
        }
    }
}

impl Snapshot {
    pub fn capture(tracks: &[Track], bpm: u32, volume: f64) -> Self {
        Self {
            tracks: tracks.iter().map(TrackData::from).collect(),
            bpm,
            volume,
        }
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    /// Highest track or clip id in the snapshot, if any.
    pub fn max_id(&self) -> Option<u64> {
        self.tracks
            .iter()
            .flat_map(|t| std::iter::once(t.id).chain(t.clips.iter().map(|c| c.id)))
            .max()
    }

    /// Check structural invariants of a snapshot that came from outside.
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.bpm == 0 {
            return Err(ProjectError::Invalid("bpm must be positive".into()));
        }
        if !self.volume.is_finite() {
            return Err(ProjectError::Invalid("volume is not finite".into()));
        }

        let mut track_ids = HashSet::new();
        let mut clip_ids = HashSet::new();

        for track in &self.tracks {
            // The session allocates fresh ids past the largest loaded one
            if track.id == u64::MAX {
                return Err(ProjectError::Invalid("track id out of range".into()));
            }
            if !track_ids.insert(track.id) {
                return Err(ProjectError::Invalid(format!(
                    "duplicate track id {}",
                    track.id
                )));
            }
            if TrackColor::from_name(&track.color).is_none() {
                return Err(ProjectError::Invalid(format!(
                    "track {} has unknown color '{}'",
                    track.id, track.color
                )));
            }
            if !track.volume.is_finite() || !track.effects.all_finite() {
                return Err(ProjectError::Invalid(format!(
                    "track {} has non-finite levels",
                    track.id
                )));
            }

            for clip in &track.clips {
                if clip.id == u64::MAX {
                    return Err(ProjectError::Invalid("clip id out of range".into()));
                }
                if !clip_ids.insert(clip.id) {
                    return Err(ProjectError::Invalid(format!(
                        "duplicate clip id {}",
                        clip.id
                    )));
                }
                if !clip.start.is_finite() || !clip.end.is_finite() || clip.end <= clip.start {
                    return Err(ProjectError::Invalid(format!(
                        "clip {} has invalid range [{}, {})",
                        clip.id, clip.start, clip.end
                    )));
                }
                let audio = &clip.audio;
                if audio.channels == 0
                    || audio.sample_rate == 0
                    || audio.samples.len() % audio.channels as usize != 0
                {
                    return Err(ProjectError::Invalid(format!(
                        "clip {} has malformed audio",
                        clip.id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Validate and rebuild model tracks, allocating fresh shared audio buffers.
    pub fn into_tracks(self) -> Result<Vec<Track>, ProjectError> {
        self.validate()?;

        self.tracks
            .into_iter()
            .map(|data| {
                let color = TrackColor::from_name(&data.color)
                    .ok_or_else(|| ProjectError::Invalid(format!("unknown color '{}'", data.color)))?;
                let mut track = Track::new(TrackId(data.id), data.name, data.kind, color);
                track.volume = clamp_to_range(data.volume, LEVEL_RANGE);
                track.effects = EffectSettings::from(data.effects).clamped();

                for clip in data.clips {
                    let audio = AudioArc::try_new(
                        clip.audio.samples,
                        clip.audio.sample_rate,
                        clip.audio.channels,
                    )
                    .ok_or_else(|| {
                        ProjectError::Invalid(format!("clip {} has malformed audio", clip.id))
                    })?;
                    track.push_clip(Clip {
                        id: ClipId(clip.id),
                        start: clip.start,
                        end: clip.end,
                        audio,
                    });
                }
                Ok(track)
            })
            .collect()
    }
}

impl EffectData {
    fn all_finite(&self) -> bool {
        [
            self.pre_gain,
            self.clarity,
            self.pan,
            self.reverb,
            self.delay,
            self.compression,
            self.eq,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}
