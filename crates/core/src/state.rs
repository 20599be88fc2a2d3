use crate::clip_ops;
use crate::error::{EngineError, Result};
use saund_project::Snapshot;
use saund_transport::{Clip, ClipId, Track, TrackId, TrackParam};

/// The editable project: tracks plus global mix settings.
///
/// Every method that touches clips recomputes `duration` before returning, so
/// the derived value is never observable out of date.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectState {
    tracks: Vec<Track>,
    volume: f64,
    bpm: u32,
    selected_track: Option<TrackId>,
    duration: f64,
}

impl ProjectState {
    pub fn new(volume: f64, bpm: u32) -> Self {
        Self {
            tracks: Vec::new(),
            volume,
            bpm: bpm.max(1),
            selected_track: None,
            duration: 0.0,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|track| track.id == id)
            .ok_or(EngineError::TrackNotFound(id))
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn selected_track(&self) -> Option<TrackId> {
        self.selected_track
    }

    /// Latest clip end across all tracks.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.tracks, self.bpm, self.volume)
    }

    pub(crate) fn insert_track(&mut self, index: usize, track: Track) {
        let index = index.min(self.tracks.len());
        self.tracks.insert(index, track);
        self.recompute_duration();
    }

    /// Remove a track, dropping the selection if it pointed at it.
    pub(crate) fn remove_track(&mut self, id: TrackId) -> Result<Track> {
        let index = self
            .tracks
            .iter()
            .position(|track| track.id == id)
            .ok_or(EngineError::TrackNotFound(id))?;
        let track = self.tracks.remove(index);
        if self.selected_track == Some(id) {
            self.selected_track = None;
        }
        self.recompute_duration();
        Ok(track)
    }

    pub(crate) fn set_track_param(
        &mut self,
        track_id: TrackId,
        param: TrackParam,
        value: f64,
    ) -> Result<()> {
        self.track_mut(track_id)?.set_param(param, value);
        Ok(())
    }

    pub(crate) fn push_clip(&mut self, track_id: TrackId, clip: Clip) -> Result<()> {
        self.track_mut(track_id)?.push_clip(clip);
        self.recompute_duration();
        Ok(())
    }

    pub(crate) fn remove_clip(&mut self, track_id: TrackId, clip_id: ClipId) -> Result<Clip> {
        let clip = self
            .track_mut(track_id)?
            .remove_clip(clip_id)
            .ok_or(EngineError::ClipNotFound {
                track: track_id,
                clip: clip_id,
            })?;
        self.recompute_duration();
        Ok(clip)
    }

    /// Set a clip's interval verbatim.
    pub(crate) fn place_clip(
        &mut self,
        track_id: TrackId,
        clip_id: ClipId,
        (start, end): (f64, f64),
    ) -> Result<()> {
        let clip = self
            .track_mut(track_id)?
            .clip_mut(clip_id)
            .ok_or(EngineError::ClipNotFound {
                track: track_id,
                clip: clip_id,
            })?;
        clip.start = start;
        clip.end = end;
        self.recompute_duration();
        Ok(())
    }

    pub(crate) fn set_selected_track(&mut self, id: Option<TrackId>) -> Result<()> {
        if let Some(id) = id {
            if self.track(id).is_none() {
                return Err(EngineError::TrackNotFound(id));
            }
        }
        self.selected_track = id;
        Ok(())
    }

    /// Reinstate a selection lost to an undo, unless something else has
    /// been selected since or the track is still missing.
    pub(crate) fn restore_selection(&mut self, id: TrackId) {
        if self.selected_track.is_none() && self.track(id).is_some() {
            self.selected_track = Some(id);
        }
    }

    pub(crate) fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    pub(crate) fn set_bpm(&mut self, bpm: u32) {
        self.bpm = bpm.max(1);
    }

    /// Swap in a whole new track set, keeping the selection only if it survived.
    pub(crate) fn replace(&mut self, tracks: Vec<Track>, bpm: u32, volume: f64) {
        self.tracks = tracks;
        self.bpm = bpm.max(1);
        self.volume = volume;
        if let Some(id) = self.selected_track {
            if self.track(id).is_none() {
                self.selected_track = None;
            }
        }
        self.recompute_duration();
    }

    fn recompute_duration(&mut self) {
        self.duration = clip_ops::project_duration(&self.tracks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saund_transport::{AudioArc, EffectField, TrackColor};

    fn track(id: u64) -> Track {
        Track::new(TrackId(id), format!("Keys {id}"), "Keys".into(), TrackColor::Green)
    }

    fn clip(id: u64, start: f64, end: f64) -> Clip {
        Clip {
            id: ClipId(id),
            start,
            end,
            audio: AudioArc::new(vec![0.0; 4], 44100, 1),
        }
    }

    #[test]
    fn test_duration_follows_clip_changes() {
        let mut state = ProjectState::new(75.0, 120);
        state.insert_track(0, track(1));
        assert_eq!(state.duration(), 0.0);

        state.push_clip(TrackId(1), clip(2, 0.0, 5.0)).expect("push");
        state.push_clip(TrackId(1), clip(3, 10.0, 12.0)).expect("push");
        assert_eq!(state.duration(), 12.0);

        state.place_clip(TrackId(1), ClipId(2), (20.0, 25.0)).expect("place");
        assert_eq!(state.duration(), 25.0);

        state.remove_clip(TrackId(1), ClipId(2)).expect("remove");
        assert_eq!(state.duration(), 12.0);

        state.remove_track(TrackId(1)).expect("remove track");
        assert_eq!(state.duration(), 0.0);
    }

    #[test]
    fn test_missing_ids_leave_state_untouched() {
        let mut state = ProjectState::new(75.0, 120);
        state.insert_track(0, track(1));
        let before = state.clone();

        assert!(matches!(
            state.push_clip(TrackId(9), clip(2, 0.0, 1.0)),
            Err(EngineError::TrackNotFound(TrackId(9)))
        ));
        assert!(matches!(
            state.place_clip(TrackId(1), ClipId(9), (0.0, 1.0)),
            Err(EngineError::ClipNotFound { .. })
        ));
        assert!(state
            .set_track_param(TrackId(9), TrackParam::Effect(EffectField::Pan), 10.0)
            .is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_selection_must_reference_present_track() {
        let mut state = ProjectState::new(75.0, 120);
        state.insert_track(0, track(1));

        assert!(state.set_selected_track(Some(TrackId(2))).is_err());
        state.set_selected_track(Some(TrackId(1))).expect("select");
        assert_eq!(state.selected_track(), Some(TrackId(1)));

        state.remove_track(TrackId(1)).expect("remove");
        assert_eq!(state.selected_track(), None);
    }

    #[test]
    fn test_replace_drops_vanished_selection() {
        let mut state = ProjectState::new(75.0, 120);
        state.insert_track(0, track(1));
        state.set_selected_track(Some(TrackId(1))).expect("select");

        let mut replacement = track(5);
        replacement.push_clip(clip(6, 1.0, 4.0));
        state.replace(vec![replacement], 90, 60.0);

        assert_eq!(state.selected_track(), None);
        assert_eq!(state.bpm(), 90);
        assert_eq!(state.volume(), 60.0);
        assert_eq!(state.duration(), 4.0);
    }

    #[test]
    fn test_bpm_stays_positive() {
        let mut state = ProjectState::new(75.0, 0);
        assert_eq!(state.bpm(), 1);
        state.set_bpm(0);
        assert_eq!(state.bpm(), 1);
    }
}
